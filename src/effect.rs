use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<A> = Pin<Box<dyn Future<Output = A> + Send + 'static>>;

/// What a reducer wants to happen after it mutated the state.
/// Follow-up actions run synchronously and in order, futures are
/// handed to the store and resolve into a new action later.
pub enum Effect<A> {
    Nothing,
    Action(A),
    Future(BoxFuture<A>),
    Multiple(Vec<Effect<A>>),
}

impl<A: Send + 'static> Effect<A> {
    pub const NONE: Self = Effect::Nothing;

    pub fn action(action: A) -> Self {
        Effect::Action(action)
    }

    pub fn future<T, F>(future: F, mapper: impl FnOnce(T) -> A + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Effect::Future(Box::pin(async move { mapper(future.await) }))
    }

    pub fn merge2(a: Self, b: Self) -> Self {
        Effect::Multiple(vec![a, b])
    }

    pub fn merge3(a: Self, b: Self, c: Self) -> Self {
        Effect::Multiple(vec![a, b, c])
    }

    pub fn merge(effects: impl IntoIterator<Item = Self>) -> Self {
        Effect::Multiple(effects.into_iter().collect())
    }
}

impl<A: std::fmt::Debug> std::fmt::Debug for Effect<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nothing => write!(f, "Nothing"),
            Self::Action(arg0) => f.debug_tuple("Action").field(arg0).finish(),
            Self::Future(_) => f.debug_tuple("Future").finish(),
            Self::Multiple(arg0) => f.debug_tuple("Multiple").field(arg0).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn future_maps_its_output() {
        let Effect::Future(fut) = Effect::future(async { 20u8 }, |v| v + 1) else {
            panic!("expected a future effect");
        };
        assert_eq!(fut.await, 21);
    }
}
