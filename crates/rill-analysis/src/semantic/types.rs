/// Semantic type tag for a Rill value.
///
/// Rill is dynamically typed; the analyzer tracks these coarse tags to catch
/// statically-decidable operator misuse and to seed the code generator.
/// `Unknown` is the inference placeholder: any check involving it is skipped
/// rather than reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Null,
    Int,
    Double,
    String,
    Bool,
    Void,
    Unknown,
}

impl TypeTag {
    /// Whether this tag is numeric (`Int` or `Double`).
    pub fn is_numeric(self) -> bool {
        matches!(self, TypeTag::Int | TypeTag::Double)
    }

    /// Whether this tag carries no usable information: checks involving it
    /// defer instead of erroring.
    pub fn is_indefinite(self) -> bool {
        matches!(self, TypeTag::Unknown | TypeTag::Void)
    }

    /// Human-readable name for error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            TypeTag::Null => "Null",
            TypeTag::Int => "Int",
            TypeTag::Double => "Double",
            TypeTag::String => "String",
            TypeTag::Bool => "Bool",
            TypeTag::Void => "Void",
            TypeTag::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_tags() {
        assert!(TypeTag::Int.is_numeric());
        assert!(TypeTag::Double.is_numeric());
        assert!(!TypeTag::String.is_numeric());
        assert!(!TypeTag::Unknown.is_numeric());
    }

    #[test]
    fn indefinite_tags() {
        assert!(TypeTag::Unknown.is_indefinite());
        assert!(TypeTag::Void.is_indefinite());
        assert!(!TypeTag::Null.is_indefinite());
    }
}
