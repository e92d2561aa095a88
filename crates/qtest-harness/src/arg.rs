//! Type-erased argument values captured from lifecycle calls.

use std::any::{self, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::lifecycle::Cleanup;

/// Ordered argument list handed to a lifecycle operation.
pub type Args = Vec<Arg>;

/// A single argument whose concrete type is only known at runtime.
///
/// An `Arg` is either *absent*, the equivalent of passing nothing, or
/// *present*. A present argument keeps its dynamic type and remembers how it
/// was captured:
///
/// - [`Arg::value`] captures a comparison-capable value. Two such arguments
///   of the same type are compared with `PartialEq`.
/// - [`Arg::opaque`] captures any value, including closures. Opaque values
///   never take part in value comparison; only their type is checked.
///
/// Cloning an `Arg` shares the captured value.
///
/// ```
/// use qtest_harness::{Arg, args};
///
/// let captured = args!["Format {}", 42_u8, None::<i32>];
/// assert_eq!(captured.len(), 3);
/// assert_eq!(captured[1].downcast_ref::<u8>(), Some(&42));
/// assert!(captured[2].is_absent());
/// assert_eq!(Arg::value(7_i64).type_name().as_deref(), Some("i64"));
/// ```
#[derive(Clone, Default)]
pub struct Arg {
    value: Option<Arc<dyn ErasedValue>>,
}

impl Arg {
    /// Captures a value that supports equality comparison.
    #[must_use]
    pub fn value<T>(value: T) -> Self
    where
        T: PartialEq + fmt::Debug + Send + Sync + 'static,
    {
        Self {
            value: Some(Arc::new(Comparable(value))),
        }
    }

    /// Captures a value that is never compared, only type-checked.
    #[must_use]
    pub fn opaque<T>(value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self {
            value: Some(Arc::new(Opaque(value))),
        }
    }

    /// Returns the absent argument.
    #[must_use]
    pub const fn absent() -> Self {
        Self { value: None }
    }

    /// Returns `true` when no value was captured.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        self.value.is_none()
    }

    /// Returns `true` when a value was captured.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.value.is_some()
    }

    /// Returns `true` when the captured value takes part in value comparison.
    #[must_use]
    pub fn is_comparable(&self) -> bool {
        self.value.as_ref().is_some_and(|value| value.is_comparable())
    }

    /// Returns the [`TypeId`] of the captured value.
    #[must_use]
    pub fn value_type_id(&self) -> Option<TypeId> {
        self.value.as_ref().map(|value| value.value_type())
    }

    /// Returns the captured value's type name with module paths removed.
    #[must_use]
    pub fn type_name(&self) -> Option<String> {
        self.value
            .as_ref()
            .map(|value| short_type_name(value.type_name()))
    }

    /// Returns `true` when both arguments are present and hold the same type.
    #[must_use]
    pub fn same_type(&self, other: &Self) -> bool {
        match (self.value_type_id(), other.value_type_id()) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        }
    }

    /// Compares two captured values.
    ///
    /// Returns `None` when either side is absent, the types differ, or either
    /// side was captured as opaque.
    #[must_use]
    pub fn value_eq(&self, other: &Self) -> Option<bool> {
        let (Some(left), Some(right)) = (&self.value, &other.value) else {
            return None;
        };
        if left.value_type() != right.value_type() || !left.is_comparable() || !right.is_comparable()
        {
            return None;
        }
        Some(left.eq_value(right.as_any()))
    }

    /// Borrows the captured value as `T` when the types match.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value
            .as_ref()
            .and_then(|value| value.as_any().downcast_ref::<T>())
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => value.fmt_value(f),
            None => f.write_str("<absent>"),
        }
    }
}

/// Renders strings verbatim and every other value through its `Debug` form.
impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.downcast_ref::<String>() {
            Some(text) => f.write_str(text),
            None => fmt::Debug::fmt(self, f),
        }
    }
}

/// Conversion into an [`Arg`], used by the [`args!`](crate::args) macro.
pub trait IntoArg {
    /// Performs the conversion.
    fn into_arg(self) -> Arg;
}

impl IntoArg for Arg {
    fn into_arg(self) -> Arg {
        self
    }
}

macro_rules! comparable_into_arg {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl IntoArg for $ty {
                fn into_arg(self) -> Arg {
                    Arg::value(self)
                }
            }
        )+
    };
}

comparable_into_arg!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char, String,
);

impl IntoArg for &str {
    fn into_arg(self) -> Arg {
        Arg::value(self.to_owned())
    }
}

impl<T> IntoArg for Vec<T>
where
    T: PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn into_arg(self) -> Arg {
        Arg::value(self)
    }
}

impl<T: IntoArg> IntoArg for Option<T> {
    fn into_arg(self) -> Arg {
        self.map_or_else(Arg::absent, IntoArg::into_arg)
    }
}

impl IntoArg for Cleanup {
    fn into_arg(self) -> Arg {
        Arg::opaque(self)
    }
}

/// Builds an [`Args`] list from heterogeneous values.
///
/// Each element is converted with [`IntoArg`]; wrap values of other types in
/// [`Arg::value`] or [`Arg::opaque`].
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::IntoArg::into_arg($arg)),+]
    };
}

trait ErasedValue: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn value_type(&self) -> TypeId;
    fn type_name(&self) -> &'static str;
    fn is_comparable(&self) -> bool;
    fn eq_value(&self, other: &dyn Any) -> bool;
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

struct Comparable<T>(T);

impl<T> ErasedValue for Comparable<T>
where
    T: PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        &self.0
    }

    fn value_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }

    fn is_comparable(&self) -> bool {
        true
    }

    fn eq_value(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<T>()
            .is_some_and(|other_value| *other_value == self.0)
    }

    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

struct Opaque<T>(T);

impl<T> ErasedValue for Opaque<T>
where
    T: Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        &self.0
    }

    fn value_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }

    fn is_comparable(&self) -> bool {
        false
    }

    fn eq_value(&self, _other: &dyn Any) -> bool {
        false
    }

    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", short_type_name(any::type_name::<T>()))
    }
}

/// Strips module paths from a fully qualified type name, keeping generics.
///
/// `alloc::vec::Vec<core::option::Option<i32>>` becomes `Vec<Option<i32>>`.
pub(crate) fn short_type_name(full: &str) -> String {
    let mut short = String::with_capacity(full.len());
    let mut path_start = 0;
    let mut chars = full.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == ':' && chars.peek() == Some(&':') {
            chars.next();
            short.truncate(path_start);
        } else if ch.is_alphanumeric() || ch == '_' {
            short.push(ch);
        } else {
            short.push(ch);
            path_start = short.len();
        }
    }
    short
}
