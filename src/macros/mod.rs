mod cfg;
mod flow;

// crate `cfg_if` cannot be used with `stmt` fragments on stable toolchains,
// so we roll our own pair of conditional-compilation helpers here.
#[macro_export]
macro_rules! cfg_if_async {
    ($item1:stmt, $item2:stmt) => {
        #[cfg(feature = "async")]
        $item1;
        #[cfg(not(feature = "async"))]
        $item2;
    };
}

#[macro_export]
macro_rules! cfg_async {
    ($($item:item)*) => {
        $(
            #[cfg(feature = "async")]
            $item
        )*
    }
}

#[macro_export]
macro_rules! cfg_not_async {
    ($($item:item)*) => {
        $(
            #[cfg(not(feature = "async"))]
            $item
        )*
    }
}
