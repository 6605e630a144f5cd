//! Macros to reduce boilerplate for keyword enums

/// Generate `Display` and case-insensitive `FromStr` for a keyword enum.
///
/// # Usage
///
/// ```rust,ignore
/// keyword_enum!(
///     SortField,
///     ChantagError::invalid_sort_field,
///     {
///         Name => "name",
///         Type => "type",
///     }
/// );
/// ```
#[macro_export]
macro_rules! keyword_enum {
    (
        $enum_name:ident,
        $error_ctor:path,
        { $($variant:ident => $str:expr),+ $(,)? }
    ) => {
        impl $enum_name {
            /// Every accepted keyword, in declaration order.
            pub const KEYWORDS: &[&str] = &[$($str),+];
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($enum_name::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::error::ChantagError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok($enum_name::$variant),)+
                    _ => Err($error_ctor(s.to_string())),
                }
            }
        }
    };
}

#[cfg(test)]
mod test {
    use crate::error::ChantagError;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Shade {
        Light,
        Dark,
    }

    keyword_enum!(Shade, ChantagError::Other, { Light => "light", Dark => "dark" });

    #[test]
    fn test_display() {
        assert_eq!(Shade::Light.to_string(), "light");
        assert_eq!(Shade::Dark.to_string(), "dark");
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!("LIGHT".parse::<Shade>().unwrap(), Shade::Light);
        assert_eq!(" dark ".parse::<Shade>().unwrap(), Shade::Dark);
        assert!("dim".parse::<Shade>().is_err());
    }

    #[test]
    fn test_keywords() {
        assert_eq!(Shade::KEYWORDS, &["light", "dark"]);
    }
}
