//! The callback conventions recognized when turning an asynchronous function
//! into a blocking one.
//!
//! Completion callbacks take the outputs positionally: `FnOnce()`,
//! `FnOnce(O0)`, up to `FnOnce(O0, O1, O2, O3)`, optionally followed by an
//! `Option<E>` in the trailing-error convention. The bridge packs them into
//! `()`, `O0` or a tuple `(O0, .., Om)`.

use core::fmt::Debug;
use core::marker::PhantomData;

#[cfg(feature = "use_serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "use_strum")]
use strum_macros::{Display, EnumString};

#[cfg(feature = "use_numenum")]
use num_enum::TryFromPrimitive;

use crate::outcome::Notifier;

/// Called with the success payload.
pub type CompletionHandler<O> = Box<dyn FnOnce(O) + Send + 'static>;

/// Called with the error instead of the completion handler.
pub type ErrorHandler<E> = Box<dyn FnOnce(E) + Send + 'static>;

/// Called with the success payload followed by an error, which, if present,
/// turns the call into a failure.
pub type OptionalErrorHandler<O, E> = Box<dyn FnOnce(O, Option<E>) + Send + 'static>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "use_serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "use_strum", derive(EnumString, Display))]
#[cfg_attr(feature = "use_numenum", derive(TryFromPrimitive))]
#[repr(u8)]
pub enum ShapeKind {
    #[cfg_attr(feature = "use_serde", serde(rename = "no_error"))]
    #[cfg_attr(feature = "use_strum", strum(serialize = "no_error"))]
    NoError,
    #[cfg_attr(feature = "use_serde", serde(rename = "dual_handler"))]
    #[cfg_attr(feature = "use_strum", strum(serialize = "dual_handler"))]
    DualHandler,
    #[cfg_attr(feature = "use_serde", serde(rename = "trailing_error"))]
    #[cfg_attr(feature = "use_strum", strum(serialize = "trailing_error"))]
    TrailingError,
}

/// A boxed completion callback taking zero to four outputs.
pub trait Completion: Send + 'static {
    /// `()` for no outputs, the output itself for one, a tuple otherwise.
    type Payload: Send + 'static;

    /// Builds the callback so that it hands its packed outputs to `sink`.
    fn packing<S>(sink: S) -> Self
    where
        S: FnOnce(Self::Payload) + Send + 'static;
}

/// A boxed completion callback taking zero to four outputs followed by an
/// optional error.
pub trait FallibleCompletion: Send + 'static {
    type Payload: Send + 'static;

    type Error: Send + 'static;

    fn packing<S>(sink: S) -> Self
    where
        S: FnOnce(Self::Payload, Option<Self::Error>) + Send + 'static;
}

macro_rules! impl_outputs {
    ($payload:ty => $packed:expr; $($output:ident $arg:ident),*) => {
        impl<$($output,)*> Completion for Box<dyn FnOnce($($output),*) + Send + 'static>
        where
            $($output: Send + 'static,)*
        {
            type Payload = $payload;

            fn packing<S>(sink: S) -> Self
            where
                S: FnOnce($payload) + Send + 'static,
            {
                Box::new(move |$($arg),*| sink($packed))
            }
        }

        impl<E, $($output,)*> FallibleCompletion
            for Box<dyn FnOnce($($output,)* Option<E>) + Send + 'static>
        where
            E: Send + 'static,
            $($output: Send + 'static,)*
        {
            type Payload = $payload;

            type Error = E;

            fn packing<S>(sink: S) -> Self
            where
                S: FnOnce($payload, Option<E>) + Send + 'static,
            {
                Box::new(move |$($arg,)* error| sink($packed, error))
            }
        }
    };
}

impl_outputs!(() => (););
impl_outputs!(O0 => o0; O0 o0);
impl_outputs!((O0, O1) => (o0, o1); O0 o0, O1 o1);
impl_outputs!((O0, O1, O2) => (o0, o1, o2); O0 o0, O1 o1, O2 o2);
impl_outputs!((O0, O1, O2, O3) => (o0, o1, o2, o3); O0 o0, O1 o1, O2 o2, O3 o3);

/// A static description of how an asynchronous function reports its outcome.
///
/// `Handlers` are the callback parameters the function expects (as a tuple, in
/// parameter order), `Payload` is what the callbacks leave behind for the
/// blocked caller and `Output` is what the blocking call finally returns.
pub trait CallbackShape {
    const KIND: ShapeKind;

    type Payload: Send + 'static;

    type Handlers;

    type Output;

    fn handlers(notifier: Notifier<Self::Payload>) -> Self::Handlers;

    fn resolve(payload: Self::Payload) -> Self::Output;
}

/// A single completion handler `H`; the call cannot fail.
pub struct NoError<H>(PhantomData<fn() -> H>);

impl<H> CallbackShape for NoError<H>
where
    H: Completion,
{
    const KIND: ShapeKind = ShapeKind::NoError;

    type Payload = H::Payload;

    type Handlers = (H,);

    type Output = H::Payload;

    fn handlers(notifier: Notifier<H::Payload>) -> Self::Handlers {
        (H::packing(move |output| notifier.notify(output)),)
    }

    fn resolve(payload: H::Payload) -> H::Payload {
        payload
    }
}

/// A completion handler `H` and a separate error handler.
pub struct DualHandler<H, E>(PhantomData<fn() -> (H, E)>);

impl<H, E> CallbackShape for DualHandler<H, E>
where
    H: Completion,
    E: Send + 'static,
{
    const KIND: ShapeKind = ShapeKind::DualHandler;

    type Payload = Result<H::Payload, E>;

    type Handlers = (H, ErrorHandler<E>);

    type Output = Result<H::Payload, E>;

    fn handlers(notifier: Notifier<Self::Payload>) -> Self::Handlers {
        let on_error = notifier.clone();

        (
            H::packing(move |output| notifier.notify(Ok(output))),
            Box::new(move |error| on_error.notify(Err(error))),
        )
    }

    fn resolve(payload: Self::Payload) -> Self::Output {
        payload
    }
}

/// One completion handler `H` whose last argument is an optional error.
pub struct TrailingError<H>(PhantomData<fn() -> H>);

impl<H> CallbackShape for TrailingError<H>
where
    H: FallibleCompletion,
{
    const KIND: ShapeKind = ShapeKind::TrailingError;

    type Payload = Result<H::Payload, H::Error>;

    type Handlers = (H,);

    type Output = Result<H::Payload, H::Error>;

    fn handlers(notifier: Notifier<Self::Payload>) -> Self::Handlers {
        (H::packing(move |output, error| {
            notifier.notify(classify(output, error))
        }),)
    }

    fn resolve(payload: Self::Payload) -> Self::Output {
        payload
    }
}

/// Splits a trailing-error callback invocation into success or failure.
///
/// A present error wins and the payload that came with it is discarded.
pub fn classify<O, E>(payload: O, error: Option<E>) -> Result<O, E> {
    match error {
        Some(error) => Err(error),
        None => Ok(payload),
    }
}

impl<H> Debug for NoError<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("NoError")
    }
}

impl<H, E> Debug for DualHandler<H, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("DualHandler")
    }
}

impl<H> Debug for TrailingError<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("TrailingError")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::outcome::OutcomeSlot;
    use crate::rendezvous::Rendezvous;

    type Pair = Box<dyn FnOnce(u8, char) + Send>;
    type Bare = Box<dyn FnOnce() + Send>;
    type Triple = Box<dyn FnOnce(i32, i32, i32, Option<&'static str>) + Send>;
    type OnlyError = Box<dyn FnOnce(Option<&'static str>) + Send>;

    fn fire<S>(fire: impl FnOnce(S::Handlers)) -> S::Output
    where
        S: CallbackShape,
    {
        let exchange = Arc::new((OutcomeSlot::new(), Rendezvous::new()));
        exchange.1.enter();

        fire(S::handlers(Notifier::new(exchange.clone())));

        exchange.1.wait();
        S::resolve(exchange.0.take().unwrap())
    }

    #[test]
    fn trailing_error_absent_is_success() {
        assert_eq!(classify::<_, ()>((1, 2), None), Ok((1, 2)));
    }

    #[test]
    fn trailing_error_present_discards_payload() {
        assert_eq!(classify(Some(7), Some("odd")), Err("odd"));
    }

    #[test]
    fn dual_handler_error_channel() {
        let result = fire::<DualHandler<CompletionHandler<u32>, &'static str>>(|(_, on_error)| {
            on_error("nope")
        });

        assert_eq!(result, Err("nope"));
    }

    #[test]
    fn dual_handler_completion_channel() {
        let result =
            fire::<DualHandler<CompletionHandler<u32>, &'static str>>(|(on_done, _)| on_done(3));

        assert_eq!(result, Ok(3));
    }

    #[test]
    fn single_tuple_output_stays_a_tuple() {
        let result = fire::<NoError<CompletionHandler<(u8, char)>>>(|(on_done,)| on_done((1, 'a')));

        assert_eq!(result, (1, 'a'));
    }

    #[test]
    fn positional_outputs_are_packed() {
        assert_eq!(fire::<NoError<Pair>>(|(on_done,)| on_done(1, 'a')), (1, 'a'));
        fire::<NoError<Bare>>(|(on_done,)| on_done());
    }

    #[test]
    fn positional_outputs_before_trailing_error() {
        assert_eq!(
            fire::<TrailingError<Triple>>(|(on_done,)| on_done(1, 2, 3, None)),
            Ok((1, 2, 3))
        );
        assert_eq!(
            fire::<TrailingError<Triple>>(|(on_done,)| on_done(1, 2, 3, Some("late"))),
            Err("late")
        );
    }

    #[test]
    fn trailing_error_alone() {
        assert_eq!(fire::<TrailingError<OnlyError>>(|(on_done,)| on_done(None)), Ok(()));
        assert_eq!(
            fire::<TrailingError<OnlyError>>(|(on_done,)| on_done(Some("gone"))),
            Err("gone")
        );
    }

    #[cfg(feature = "use_strum")]
    #[test]
    fn kind_names() {
        use core::str::FromStr;

        assert_eq!(ShapeKind::TrailingError.to_string(), "trailing_error");
        assert_eq!(ShapeKind::from_str("dual_handler"), Ok(ShapeKind::DualHandler));
    }

    #[cfg(feature = "use_numenum")]
    #[test]
    fn kind_from_u8() {
        use core::convert::TryFrom;

        assert_eq!(ShapeKind::try_from(0u8).ok(), Some(ShapeKind::NoError));
        assert!(ShapeKind::try_from(3u8).is_err());
    }

    #[cfg(feature = "use_serde")]
    #[test]
    fn kind_in_json() {
        assert_eq!(
            serde_json::to_string(&ShapeKind::NoError).unwrap(),
            "\"no_error\""
        );
    }
}
