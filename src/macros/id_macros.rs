//! Identifier macros for Manager-owned registries.

/// Declares a copyable index type for one of the Manager's registries.
///
/// The generated type wraps the position of the entity in its registry and
/// prints as `<prefix>#<index>`.
///
/// # Example
/// ```ignore
/// registry_id!(
///     /// Handle of a registered station
///     StationId, "station"
/// );
/// ```
#[macro_export]
macro_rules! registry_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position of the entity in its registry
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", $prefix, self.0)
            }
        }
    };
}
