//! Calling functions of up to four inputs with their arguments packed in a tuple.

/// A synchronous function of the inputs in `Args`.
pub trait Callable<Args> {
    type Output;

    fn call_with(&self, args: Args) -> Self::Output;
}

/// An asynchronous function of the inputs in `Args`, taking its callback
/// parameters (`Handlers`, in parameter order) right after the inputs.
///
/// `Handle` is whatever the function returns; `()` for functions which start
/// working on their own.
pub trait AsyncFn<Args, Handlers> {
    type Handle;

    fn invoke(&self, args: Args, handlers: Handlers) -> Self::Handle;
}

macro_rules! impl_arity {
    ($($input:ident $arg:ident),*) => {
        impl<F, O, $($input,)*> Callable<($($input,)*)> for F
        where
            F: Fn($($input),*) -> O,
        {
            type Output = O;

            fn call_with(&self, ($($arg,)*): ($($input,)*)) -> O {
                self($($arg),*)
            }
        }

        impl<F, R, H0, $($input,)*> AsyncFn<($($input,)*), (H0,)> for F
        where
            F: Fn($($input,)* H0) -> R,
        {
            type Handle = R;

            fn invoke(&self, ($($arg,)*): ($($input,)*), (h0,): (H0,)) -> R {
                self($($arg,)* h0)
            }
        }

        impl<F, R, H0, H1, $($input,)*> AsyncFn<($($input,)*), (H0, H1)> for F
        where
            F: Fn($($input,)* H0, H1) -> R,
        {
            type Handle = R;

            fn invoke(&self, ($($arg,)*): ($($input,)*), (h0, h1): (H0, H1)) -> R {
                self($($arg,)* h0, h1)
            }
        }
    };
}

impl_arity!();
impl_arity!(I0 i0);
impl_arity!(I0 i0, I1 i1);
impl_arity!(I0 i0, I1 i1, I2 i2);
impl_arity!(I0 i0, I1 i1, I2 i2, I3 i3);

#[cfg(test)]
mod tests {
    use super::{AsyncFn, Callable};

    fn greet(name: &str, times: usize, loud: bool, suffix: char) -> String {
        let word = if loud { "HI" } else { "hi" };

        format!("{} {}{}", vec![word; times].join(" "), name, suffix)
    }

    #[test]
    fn spreads_inputs() {
        assert_eq!(Callable::call_with(&|| 7, ()), 7);
        assert_eq!(Callable::call_with(&|n: i32| n + 1, (1,)), 2);
        assert_eq!(
            Callable::call_with(&|a: i32, b: i32| (a + b, a - b), (5, 3)),
            (8, 2)
        );
        assert_eq!(
            Callable::call_with(&greet, ("bob", 2, true, '!')),
            "HI HI bob!"
        );
    }

    #[test]
    fn passes_handlers_after_inputs() {
        type Pick = fn(i64) -> &'static str;

        let single = |a: u8, b: u8, done: fn(u8) -> u8| done(a + b);
        assert_eq!(
            AsyncFn::<(u8, u8), (fn(u8) -> u8,)>::invoke(&single, (1, 2), (|n| n * 10,)),
            30
        );

        let dual = |n: i64, ok: Pick, err: Pick| if n >= 0 { ok(n) } else { err(n) };
        assert_eq!(
            AsyncFn::<(i64,), (Pick, Pick)>::invoke(&dual, (-1,), (|_| "ok", |_| "err")),
            "err"
        );

        let nullary = |done: fn() -> bool| done();
        assert!(AsyncFn::<(), (fn() -> bool,)>::invoke(
            &nullary,
            (),
            (|| true,)
        ));
    }
}
