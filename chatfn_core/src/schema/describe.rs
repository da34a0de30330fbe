use std::collections::{BTreeMap, HashMap};

use super::TypeDescriptor;

/// Types that can describe their own shape to the parser registry.
///
/// Implemented here for the standard library types that map onto JSON, and
/// generated for user structs and fieldless enums by `#[derive(Describe)]`.
pub trait Describe {
    fn descriptor() -> TypeDescriptor;
}

macro_rules! prim {
    ($desc:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Describe for $ty {
                fn descriptor() -> TypeDescriptor {
                    $desc
                }
            }
        )+
    };
}

prim!(TypeDescriptor::Bool => bool);
prim!(TypeDescriptor::Integer => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
prim!(TypeDescriptor::Float => f32, f64);
prim!(TypeDescriptor::String => String);
prim!(TypeDescriptor::Null => ());

impl<T: Describe> Describe for Option<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::optional(T::descriptor())
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::list(T::descriptor())
    }
}

impl<T: Describe> Describe for Box<T> {
    fn descriptor() -> TypeDescriptor {
        T::descriptor()
    }
}

impl<K: Describe, V: Describe, S> Describe for HashMap<K, V, S> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::map(K::descriptor(), V::descriptor())
    }
}

impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::map(K::descriptor(), V::descriptor())
    }
}
