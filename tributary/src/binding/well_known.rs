//! Well-known URIs shared with the service backend. These strings are part of the
//! wire contract and must match exactly.

/// Root of every subscription created from an observable and an observer
pub const SUBSCRIBE: &str = "rx://builtin/subscribe";

pub mod operators {
    pub const FILTER: &str = "rx://operators/filter";
    pub const MAP: &str = "rx://operators/map";
    pub const BIND: &str = "rx://operators/bind";
    pub const TAP: &str = "rx://operators/tap";
    pub const TIMER: &str = "rx://observables/timer";
    pub const EMPTY: &str = "rx://observables/empty";
}

pub mod query {
    pub const WHERE: &str = "rx://query/where";
    pub const SELECT: &str = "rx://query/select";
    pub const COUNT: &str = "rx://query/count";
    pub const CONTAINS_KEY: &str = "rx://query/containsKey";
    pub const JOIN: &str = "rx://query/join";

    pub const ALL: [&str; 5] = [WHERE, SELECT, COUNT, CONTAINS_KEY, JOIN];

    pub fn is_operator(uri: &str) -> bool {
        ALL.contains(&uri)
    }
}

pub mod metadata {
    pub const OBSERVABLES: &str = "rx://metadata/observables";
    pub const OBSERVERS: &str = "rx://metadata/observers";
    pub const STREAM_FACTORIES: &str = "rx://metadata/streamFactories";
    pub const SUBSCRIPTION_FACTORIES: &str = "rx://metadata/subscriptionFactories";
    pub const SUBSCRIPTIONS: &str = "rx://metadata/subscriptions";
    pub const STREAMS: &str = "rx://metadata/streams";

    pub const ALL: [&str; 6] = [
        OBSERVABLES,
        OBSERVERS,
        STREAM_FACTORIES,
        SUBSCRIPTION_FACTORIES,
        SUBSCRIPTIONS,
        STREAMS,
    ];

    pub fn is_root(uri: &str) -> bool {
        ALL.contains(&uri)
    }
}
