//! Declarative record definitions.

/// Declare a struct and make it mappable to rows.
///
/// Each field may carry an annotation string after `=>`, written in the
/// directive mini-language understood by [`FieldTag`](crate::tag::FieldTag):
/// comma-separated `-`, `column:<name>`, `aliases:<a>|<b>`, `order:<int>`,
/// `primary`, `required`, `omitempty`, `default:<value>`, `prefix:<string>`,
/// `noprefix`, `flatten`.
///
/// The struct must implement `Default` (usually derived); the macro implements
/// [`Record`](crate::Record), [`DynRecord`](crate::DynRecord) and
/// [`Field`](crate::Field) for it, so it can be used as a root record, a
/// nested record, an optional nested record, or a collection element.
///
/// ```
/// use tabmap::tabular;
///
/// tabular! {
///     #[derive(Debug, Clone, Default, PartialEq)]
///     pub struct Job {
///         pub position: String,
///         pub years: Option<u32>,
///     }
/// }
///
/// tabular! {
///     #[derive(Debug, Clone, Default, PartialEq)]
///     pub struct Person {
///         pub name: String => "primary",
///         pub age: u32 => "column:Age,omitempty",
///         pub jobs: Vec<Job> => "prefix:job_",
///     }
/// }
///
/// let schema = tabmap::schema_for::<Person>().unwrap();
/// assert_eq!(schema.headers(), ["Name", "Age", "Job_position", "Job_years"]);
/// ```
#[macro_export]
macro_rules! tabular {
    (@tag) => {
        ""
    };
    (@tag $tag:literal) => {
        $tag
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $fty:ty $(=> $tag:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $fty,
            )*
        }

        impl $crate::Record for $name {
            fn fields() -> ::std::vec::Vec<$crate::FieldDef> {
                ::std::vec![
                    $(
                        $crate::FieldDef::new(
                            ::std::stringify!($field),
                            $crate::tabular!(@tag $($tag)?),
                            ::std::any::type_name::<$fty>(),
                            <$fty as $crate::Field>::shape(),
                        ),
                    )*
                ]
            }
        }

        impl $crate::DynRecord for $name {
            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn field(&self, index: usize) -> ::std::option::Option<&dyn $crate::Field> {
                let mut i = 0usize;
                $(
                    if i == index {
                        return ::std::option::Option::Some(&self.$field as &dyn $crate::Field);
                    }
                    i += 1;
                )*
                ::std::option::Option::None
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn field_mut(&mut self, index: usize) -> ::std::option::Option<&mut dyn $crate::Field> {
                let mut i = 0usize;
                $(
                    if i == index {
                        return ::std::option::Option::Some(&mut self.$field as &mut dyn $crate::Field);
                    }
                    i += 1;
                )*
                ::std::option::Option::None
            }
        }

        impl $crate::Field for $name {
            fn shape() -> $crate::Shape {
                $crate::Shape::Record($crate::Nested::of::<$name>())
            }

            fn as_record(&self) -> ::std::option::Option<&dyn $crate::DynRecord> {
                ::std::option::Option::Some(self)
            }

            fn as_record_mut(&mut self) -> ::std::option::Option<&mut dyn $crate::DynRecord> {
                ::std::option::Option::Some(self)
            }
        }
    };
}
