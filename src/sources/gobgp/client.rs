/// GoBGP gRPC client
///
/// Only the three RPCs a looking glass needs: `GetBgp` (unary), `ListPeer`
/// and `ListPath` (server streaming). Streams are handed back unconsumed;
/// callers drain them until they end or yield an error.
use super::proto::{
    GetBgpRequest, GetBgpResponse, ListPathRequest, ListPathResponse, ListPeerRequest,
    ListPeerResponse, GET_BGP_PATH, LIST_PATH_PATH, LIST_PEER_PATH,
};
use crate::config::GobgpConfig;
use crate::errors::{SourceError, SourceResult};
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};

/// Stream of decoded records, ending at the backend's end of stream
pub type RecordStream<T> = BoxStream<'static, SourceResult<T>>;

#[async_trait]
pub trait GobgpApi: Send + Sync {
    async fn get_bgp(&self) -> SourceResult<GetBgpResponse>;

    async fn list_peer(
        &self,
        request: ListPeerRequest,
    ) -> SourceResult<RecordStream<ListPeerResponse>>;

    async fn list_path(
        &self,
        request: ListPathRequest,
    ) -> SourceResult<RecordStream<ListPathResponse>>;
}

pub struct GrpcClient {
    channel: Channel,
    endpoint: String,
}

impl GrpcClient {
    /// Create the client on a lazily connected channel
    ///
    /// No connection is made here; an unreachable daemon surfaces on the
    /// first RPC. Must run inside a tokio runtime.
    pub fn connect(config: &GobgpConfig) -> SourceResult<Self> {
        let uri = config.endpoint_uri();
        let mut endpoint = Endpoint::from_shared(uri.clone())
            .map_err(|e| SourceError::Config(format!("invalid GoBGP host '{}': {}", uri, e)))?;

        if !config.insecure {
            let pem = std::fs::read(&config.tls_crt).map_err(|e| {
                SourceError::Config(format!(
                    "failed to read TLS certificate {}: {}",
                    config.tls_crt, e
                ))
            })?;
            let tls = ClientTlsConfig::new()
                .ca_certificate(Certificate::from_pem(pem))
                .domain_name(config.tls_common_name.clone());
            endpoint = endpoint
                .tls_config(tls)
                .map_err(|e| SourceError::Config(format!("invalid TLS configuration: {}", e)))?;
        }

        logger::debug(
            LogTag::Gobgp,
            &format!("gRPC channel to {} (tls: {})", uri, !config.insecure),
        );

        Ok(Self {
            channel: endpoint.connect_lazy(),
            endpoint: uri,
        })
    }

    async fn ready(&self) -> SourceResult<tonic::client::Grpc<Channel>> {
        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| SourceError::unreachable(self.endpoint.clone(), e))?;
        Ok(grpc)
    }
}

#[async_trait]
impl GobgpApi for GrpcClient {
    async fn get_bgp(&self) -> SourceResult<GetBgpResponse> {
        let mut grpc = self.ready().await?;
        let codec: ProstCodec<GetBgpRequest, GetBgpResponse> = ProstCodec::default();
        let response = grpc
            .unary(
                tonic::Request::new(GetBgpRequest {}),
                PathAndQuery::from_static(GET_BGP_PATH),
                codec,
            )
            .await?;
        Ok(response.into_inner())
    }

    async fn list_peer(
        &self,
        request: ListPeerRequest,
    ) -> SourceResult<RecordStream<ListPeerResponse>> {
        let mut grpc = self.ready().await?;
        let codec: ProstCodec<ListPeerRequest, ListPeerResponse> = ProstCodec::default();
        let response = grpc
            .server_streaming(
                tonic::Request::new(request),
                PathAndQuery::from_static(LIST_PEER_PATH),
                codec,
            )
            .await?;

        Ok(response
            .into_inner()
            .map(|item| item.map_err(SourceError::from))
            .boxed())
    }

    async fn list_path(
        &self,
        request: ListPathRequest,
    ) -> SourceResult<RecordStream<ListPathResponse>> {
        let mut grpc = self.ready().await?;
        let codec: ProstCodec<ListPathRequest, ListPathResponse> = ProstCodec::default();
        let response = grpc
            .server_streaming(
                tonic::Request::new(request),
                PathAndQuery::from_static(LIST_PATH_PATH),
                codec,
            )
            .await?;

        Ok(response
            .into_inner()
            .map(|item| item.map_err(SourceError::from))
            .boxed())
    }
}
