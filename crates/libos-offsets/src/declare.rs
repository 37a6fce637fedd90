/// Declares a table of layout constants.
///
/// ```
/// #[repr(C)]
/// pub struct Context {
///     pub syscall_nr: i64,
///     pub sp: usize,
/// }
///
/// #[repr(C)]
/// pub struct Tcb {
///     pub canary: u64,
///     pub context: Context,
/// }
///
/// libos_offsets::declare_constants! {
///     pub static OFFSETS;
///     offset(TCB_SP, Tcb, context.sp => usize);
///     size(CONTEXT_SIZE, Context);
///     define(STACK_ALIGN, 16);
/// }
///
/// assert_eq!(TCB_SP, 16);
/// assert_eq!(OFFSETS.get("CONTEXT_SIZE"), Some(16));
/// ```
///
/// Every entry becomes a `pub const NAME: usize`, an entry in the named
/// [`ConstantTable`](crate::ConstantTable) and a marker record in the
/// `.shim_offsets` section. `offset` entries name the field's type after `=>`
/// and the build fails if the field no longer has exactly that type.
///
/// Attributes in front of an entry apply to the generated `const` only.
/// Per-architecture values belong in a `define` whose expression is selected
/// by `cfg`, not in a `cfg`-gated entry.
///
/// A field path that does not exist is rejected:
///
/// ```compile_fail
/// #[repr(C)]
/// pub struct Context { pub sp: usize }
///
/// libos_offsets::declare_constants! {
///     static OFFSETS;
///     offset(CONTEXT_RET_IP, Context, ret_ip => usize);
/// }
/// ```
///
/// So is a field whose type changed:
///
/// ```compile_fail
/// #[repr(C)]
/// pub struct Context { pub sp: u32 }
///
/// libos_offsets::declare_constants! {
///     static OFFSETS;
///     offset(CONTEXT_SP, Context, sp => usize);
/// }
/// ```
///
/// And a name declared twice:
///
/// ```compile_fail
/// #[repr(C)]
/// pub struct Context { pub sp: usize, pub ret_ip: usize }
///
/// libos_offsets::declare_constants! {
///     static OFFSETS;
///     offset(CONTEXT_SP, Context, sp => usize);
///     offset(CONTEXT_SP, Context, ret_ip => usize);
/// }
/// ```
#[macro_export]
macro_rules! declare_constants {
    (@munch $head:tt [$($acc:tt)*]
        $(#[$attr:meta])*
        offset($name:ident, $root:ty, $first:ident $(. $rest:ident)* => $field_ty:ty);
        $($tail:tt)*
    ) => {
        $(#[$attr])*
        pub const $name: usize = ::core::mem::offset_of!($root, $first $(. $rest)*);

        const _: () = $crate::__private::field_has_type::<$root, $field_ty>(
            |root| &root.$first $(. $rest)*
        );

        $crate::__shim_marker!($crate::Marker::new(
            $crate::ConstantKind::Offset,
            stringify!($name),
            $name as u64,
        ));

        $crate::declare_constants!(@munch $head [
            $($acc)*
            $crate::Constant::offset(
                stringify!($name),
                stringify!($root),
                concat!(stringify!($first) $(, ".", stringify!($rest))*),
                $name,
            ),
        ] $($tail)*);
    };

    (@munch $head:tt [$($acc:tt)*]
        $(#[$attr:meta])*
        size($name:ident, $ty:ty);
        $($tail:tt)*
    ) => {
        $(#[$attr])*
        pub const $name: usize = ::core::mem::size_of::<$ty>();

        $crate::__shim_marker!($crate::Marker::new(
            $crate::ConstantKind::Size,
            stringify!($name),
            $name as u64,
        ));

        $crate::declare_constants!(@munch $head [
            $($acc)*
            $crate::Constant::size(stringify!($name), stringify!($ty), $name),
        ] $($tail)*);
    };

    (@munch $head:tt [$($acc:tt)*]
        $(#[$attr:meta])*
        define($name:ident, $value:expr);
        $($tail:tt)*
    ) => {
        $(#[$attr])*
        pub const $name: usize = $value;

        $crate::__shim_marker!($crate::Marker::new(
            $crate::ConstantKind::Define,
            stringify!($name),
            $name as u64,
        ));

        $crate::declare_constants!(@munch $head [
            $($acc)*
            $crate::Constant::define(stringify!($name), $name),
        ] $($tail)*);
    };

    (@munch [{ $($pre:tt)* } $table:ident] [$($acc:tt)*]) => {
        $($pre)* static $table: $crate::ConstantTable = {
            const ENTRIES: &[$crate::Constant] = &[$($acc)*];
            $crate::ConstantTable::new(ENTRIES)
        };

        $crate::__shim_marker!($crate::Marker::target());
    };

    (
        $(#[$meta:meta])*
        $vis:vis static $table:ident;
        $($body:tt)*
    ) => {
        $crate::declare_constants!(@munch [{ $(#[$meta])* $vis } $table] [] $($body)*);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __shim_marker {
    ($marker:expr) => {
        const _: () = {
            #[used]
            #[cfg_attr(target_vendor = "apple", link_section = "__DATA,__shim_offsets")]
            #[cfg_attr(not(target_vendor = "apple"), link_section = ".shim_offsets")]
            static MARKER: $crate::Marker = $marker;
        };
    };
}
