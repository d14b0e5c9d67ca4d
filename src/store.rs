use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::effect::{BoxFuture, Effect};

pub trait Reducer {
    type Action: Clone + Send + std::fmt::Debug + 'static;

    type State;

    type Environment;

    fn reduce(
        action: Self::Action,
        state: &mut Self::State,
        environment: &Self::Environment,
    ) -> Effect<Self::Action>;

    fn initial_action() -> Option<Self::Action> {
        None
    }
}

/// Owns the state of one reducer and drives its effects.
///
/// Everything happens on the task that polls the store: actions are
/// reduced when they are sent, futures only make progress inside
/// [`Store::next`] / [`Store::settle`]. Responses are applied in the
/// order in which they complete.
pub struct Store<R: Reducer> {
    state: R::State,
    environment: R::Environment,
    pending: FuturesUnordered<BoxFuture<R::Action>>,
    subscribers: Vec<flume::Sender<R::Action>>,
}

impl<R: Reducer> Store<R> {
    pub fn new(state: R::State, environment: R::Environment) -> Self {
        let mut store = Self {
            state,
            environment,
            pending: FuturesUnordered::new(),
            subscribers: Vec::new(),
        };
        if let Some(action) = R::initial_action() {
            store.send(action);
        }
        store
    }

    pub fn state(&self) -> &R::State {
        &self.state
    }

    /// Receive every action right before it is reduced
    pub fn subscribe(&mut self) -> flume::Receiver<R::Action> {
        let (sender, receiver) = flume::unbounded();
        self.subscribers.push(sender);
        receiver
    }

    pub fn send(&mut self, action: R::Action) {
        self.subscribers
            .retain(|subscriber| subscriber.send(action.clone()).is_ok());
        let effect = R::reduce(action, &mut self.state, &self.environment);
        self.run(effect);
    }

    fn run(&mut self, effect: Effect<R::Action>) {
        match effect {
            Effect::Nothing => (),
            Effect::Action(action) => self.send(action),
            Effect::Future(future) => self.pending.push(future),
            Effect::Multiple(effects) => {
                for effect in effects {
                    self.run(effect);
                }
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Wait for the next in-flight future and reduce its action.
    /// Returns `false` if nothing was in flight.
    pub async fn next(&mut self) -> bool {
        match self.pending.next().await {
            Some(action) => {
                self.send(action);
                true
            }
            None => false,
        }
    }

    /// Run until no future is in flight anymore
    pub async fn settle(&mut self) {
        while self.next().await {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter;

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum CounterAction {
        Start,
        Add(u32),
        Fetch(u32),
    }

    impl Reducer for Counter {
        type Action = CounterAction;
        type State = Vec<u32>;
        type Environment = ();

        fn reduce(action: CounterAction, state: &mut Vec<u32>, _: &()) -> Effect<CounterAction> {
            match action {
                CounterAction::Start => Effect::merge3(
                    Effect::action(CounterAction::Add(1)),
                    Effect::action(CounterAction::Fetch(3)),
                    Effect::action(CounterAction::Add(2)),
                ),
                CounterAction::Add(value) => {
                    state.push(value);
                    Effect::NONE
                }
                CounterAction::Fetch(value) => {
                    Effect::future(async move { value }, CounterAction::Add)
                }
            }
        }

        fn initial_action() -> Option<CounterAction> {
            Some(CounterAction::Add(0))
        }
    }

    #[tokio::test]
    async fn follow_up_actions_run_before_futures() {
        let mut store = Store::<Counter>::new(Vec::new(), ());
        let receiver = store.subscribe();
        store.send(CounterAction::Start);
        assert_eq!(store.state(), &vec![0, 1, 2]);
        assert!(store.has_pending());

        store.settle().await;
        assert_eq!(store.state(), &vec![0, 1, 2, 3]);
        assert!(!store.has_pending());
        assert!(!store.next().await);

        let seen: Vec<_> = receiver.try_iter().collect();
        assert_eq!(
            seen,
            vec![
                CounterAction::Start,
                CounterAction::Add(1),
                CounterAction::Fetch(3),
                CounterAction::Add(2),
                CounterAction::Add(3),
            ]
        );
    }

    #[test]
    fn dropped_subscribers_are_removed() {
        let mut store = Store::<Counter>::new(Vec::new(), ());
        drop(store.subscribe());
        store.send(CounterAction::Add(5));
        assert!(store.subscribers.is_empty());
    }
}
