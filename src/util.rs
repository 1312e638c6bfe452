use enumflags2::{BitFlags, RawBitFlags};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

pub struct BitFlagsDebug<T: RawBitFlags>(pub BitFlags<T>);

impl<T: RawBitFlags + fmt::Debug> fmt::Debug for BitFlagsDebug<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut it = self.0.iter().peekable();
        write!(f, "BitFlags(")?;
        while let Some(v) = it.next() {
            write!(f, "{:?}", v)?;
            if it.peek().is_some() {
                write!(f, " | ")?;
            }
        }
        write!(f, ")")
    }
}

/// Locks the mutex, ignoring poisoning. Every critical section in this crate leaves
/// the guarded state consistent, so a panic elsewhere doesn't invalidate it.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Property;

    #[test]
    fn bit_flags_debug() {
        let flags = Property::IsScanning | Property::CanStopScan;
        assert_eq!(format!("{:?}", BitFlagsDebug(flags)), "BitFlags(IsScanning | CanStopScan)");
        assert_eq!(format!("{:?}", BitFlagsDebug(BitFlags::<Property>::empty())), "BitFlags()");
    }
}
