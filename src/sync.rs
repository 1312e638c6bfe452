#[cfg(not(feature = "async_events"))]
mod imp {
    use std::sync::mpsc;

    pub type Sender<T> = mpsc::Sender<T>;
    pub type Receiver<T> = mpsc::Receiver<T>;

    pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
        mpsc::channel()
    }

    /// Sends without blocking. Events for a dropped receiver are discarded.
    pub fn send<T>(sender: &Sender<T>, value: T) {
        let _ = sender.send(value);
    }
}

#[cfg(feature = "async_events")]
mod imp {
    use async_std::channel;

    pub type Sender<T> = channel::Sender<T>;
    pub type Receiver<T> = channel::Receiver<T>;

    pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
        channel::unbounded()
    }

    /// Sends without blocking. Events for a dropped receiver are discarded.
    pub fn send<T>(sender: &Sender<T>, value: T) {
        let _ = sender.try_send(value);
    }
}

pub use imp::*;
