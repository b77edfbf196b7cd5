/// Configuration macros
///
/// `config_struct!` defines a configuration structure with its defaults in a
/// single declaration and generates:
/// - The struct with public fields
/// - The `Default` implementation from the embedded values
/// - Serde support with `#[serde(default)]`, so every key may be omitted
///
/// # Example
/// ```
/// lg_sources::config_struct! {
///     pub struct ExampleConfig {
///         cache_ttl_secs: u64 = 300,
///         host: String = String::new(),
///     }
/// }
///
/// assert_eq!(ExampleConfig::default().cache_ttl_secs, 300);
/// ```
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
