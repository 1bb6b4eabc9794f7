//! Vendor prefix expansion for declarations.

/// Expands a declaration into itself plus any vendor-prefixed variants.
pub trait Prefixer {
    fn prefix(&self, property: &str, declaration: &str) -> String;
}

/// Properties that still need a `-webkit-` copy in some engines.
pub const WEBKIT_PROPERTIES: &[&str] = &[
    "clip-path",
    "mask",
    "mask-image",
    "mask-size",
    "mask-position",
    "mask-repeat",
    "backdrop-filter",
    "box-reflect",
    "text-stroke",
    "text-fill-color",
    "user-select",
    "appearance",
];

/// Prefixes the properties in [`WEBKIT_PROPERTIES`].
#[derive(Debug, Clone, Copy, Default)]
pub struct VendorPrefixer;

impl Prefixer for VendorPrefixer {
    fn prefix(&self, property: &str, declaration: &str) -> String {
        if WEBKIT_PROPERTIES.contains(&property) && declaration.starts_with(property) {
            format!("-webkit-{} {}", declaration, declaration)
        } else {
            declaration.to_string()
        }
    }
}

/// Leaves every declaration untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrefixer;

impl Prefixer for NoPrefixer {
    fn prefix(&self, _property: &str, declaration: &str) -> String {
        declaration.to_string()
    }
}
