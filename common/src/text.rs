//! Macros for defining validated text newtypes.

/// Macro for defining a validated text newtype.
///
/// Values are accepted only when they are not empty, have no leading or
/// trailing whitespace, and are not longer than `max_len` bytes.
///
/// # Example
///
/// ```rust
/// # use common::define_text;
/// define_text! {
///     #[doc = "Title of a book."]
///     struct Title(max_len = 16);
/// }
///
/// assert!(Title::new("Dune").is_some());
/// assert!(Title::new(" Dune").is_none());
/// assert!(Title::new("").is_none());
/// assert!(Title::new("The Left Hand of Darkness").is_none());
/// ```
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_text {
    (
        #[doc = $doc:literal]
        struct $name:ident(max_len = $max:literal);
    ) => {
        #[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        #[cfg_attr(
            feature = "serde",
            derive(
                $crate::private::serde::Deserialize,
                $crate::private::serde::Serialize,
            ),
            serde(try_from = "String", into = "String"),
        )]
        #[doc = $doc]
        pub struct $name(String);

        impl $name {
            /// Maximum length (in bytes) of a valid value.
            pub const MAX_LEN: usize = $max;

            /// Creates a new value, if the provided `text` is valid.
            #[must_use]
            pub fn new(text: impl Into<String>) -> Option<Self> {
                let text = text.into();
                Self::check(&text).then_some(Self(text))
            }

            /// Checks whether the provided `text` is a valid value.
            fn check(text: &str) -> bool {
                text.trim() == text
                    && !text.is_empty()
                    && text.len() <= Self::MAX_LEN
            }
        }

        impl ::core::convert::AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(
                &self,
                f: &mut ::core::fmt::Formatter<'_>,
            ) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = &'static str;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s).ok_or(::core::concat!(
                    "invalid `",
                    ::core::stringify!($name),
                    "`",
                ))
            }
        }

        impl ::core::convert::TryFrom<String> for $name {
            type Error = &'static str;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s).ok_or(::core::concat!(
                    "invalid `",
                    ::core::stringify!($name),
                    "`",
                ))
            }
        }

        impl ::core::convert::From<$name> for String {
            fn from(v: $name) -> Self {
                v.0
            }
        }

        #[cfg(feature = "postgres")]
        impl<'a> $crate::private::postgres_types::FromSql<'a> for $name {
            $crate::private::postgres_types::accepts!(VARCHAR, TEXT);

            fn from_sql(
                ty: &$crate::private::postgres_types::Type,
                raw: &'a [u8],
            ) -> Result<
                $name,
                Box<dyn ::std::error::Error
                    + ::core::marker::Sync
                    + ::core::marker::Send>,
            > {
                <String as $crate::private::postgres_types::FromSql<'a>>
                    ::from_sql(ty, raw)
                    .map(Self)
            }
        }

        #[cfg(feature = "postgres")]
        impl $crate::private::postgres_types::ToSql for $name {
            $crate::private::postgres_types::accepts!(VARCHAR, TEXT);
            $crate::private::postgres_types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &$crate::private::postgres_types::Type,
                w: &mut $crate::private::postgres_types::private::BytesMut,
            ) -> Result<
                $crate::private::postgres_types::IsNull,
                ::std::boxed::Box<
                    dyn ::std::error::Error
                        + ::core::marker::Sync
                        + ::core::marker::Send
                >,
            > {
                <&str as $crate::private::postgres_types::ToSql>::to_sql(
                    &self.0.as_str(),
                    ty,
                    w,
                )
            }
        }
    };
}
