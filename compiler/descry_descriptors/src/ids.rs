//! Id handles into the descriptor arena.
//!
//! Ids are plain indices: equality is O(1) and means "same descriptor".

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

define_id!(
    /// A class, interface, enum, annotation class, enum entry or class object.
    ClassId
);
define_id!(TypeParamId);
define_id!(FunctionId);
define_id!(PropertyId);
define_id!(ConstructorId);
define_id!(AnnotationId);
define_id!(PackageId);

/// Any declaration that can own type parameters or annotations.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Owner {
    Package(PackageId),
    Class(ClassId),
    Function(FunctionId),
    Property(PropertyId),
    Constructor(ConstructorId),
}
