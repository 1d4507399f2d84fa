//! # Lease Entity
//!
//! Lease transitions are pure functions of the stored lease and the clock so
//! every store applies the same rules inside its own atomic section.

use serde::{Deserialize, Serialize};
use shared_types::ConsensusTimestamp;
use uuid::Uuid;

/// A time-bounded exclusive claim on one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub job: String,
    pub holder: Uuid,
    /// When the current holder first took the lease (ns).
    pub acquired_at: ConsensusTimestamp,
    /// Lease lapses at this instant unless renewed (ns).
    pub expires_at: ConsensusTimestamp,
}

impl Lease {
    pub fn is_expired(&self, now: ConsensusTimestamp) -> bool {
        now >= self.expires_at
    }

    /// The lease `holder` gets when acquiring over `existing`, or `None` if
    /// another holder's lease is still live. Re-acquiring one's own lease
    /// renews it.
    pub fn grant(
        existing: Option<&Lease>,
        job: &str,
        holder: Uuid,
        now: ConsensusTimestamp,
        ttl_nanos: u64,
    ) -> Option<Lease> {
        let expires_at = now.saturating_add(ttl_nanos);
        match existing {
            Some(lease) if lease.holder == holder && !lease.is_expired(now) => Some(Lease {
                expires_at,
                ..lease.clone()
            }),
            Some(lease) if !lease.is_expired(now) => None,
            _ => Some(Lease {
                job: job.to_string(),
                holder,
                acquired_at: now,
                expires_at,
            }),
        }
    }

    /// The renewed lease, or `None` if `holder` no longer holds it.
    pub fn renewal(
        existing: Option<&Lease>,
        holder: Uuid,
        now: ConsensusTimestamp,
        ttl_nanos: u64,
    ) -> Option<Lease> {
        match existing {
            Some(lease) if lease.holder == holder && !lease.is_expired(now) => Some(Lease {
                expires_at: now.saturating_add(ttl_nanos),
                ..lease.clone()
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_rules() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let first = Lease::grant(None, "job", a, 100, 50).unwrap();
        assert_eq!((first.acquired_at, first.expires_at), (100, 150));

        assert!(Lease::grant(Some(&first), "job", b, 149, 50).is_none());

        let renewed = Lease::grant(Some(&first), "job", a, 120, 50).unwrap();
        assert_eq!((renewed.acquired_at, renewed.expires_at), (100, 170));

        let taken = Lease::grant(Some(&first), "job", b, 150, 50).unwrap();
        assert_eq!(taken.holder, b);
        assert_eq!(taken.acquired_at, 150);
    }

    #[test]
    fn test_renewal_requires_live_lease() {
        let a = Uuid::new_v4();
        let lease = Lease::grant(None, "job", a, 0, 10).unwrap();
        assert!(Lease::renewal(Some(&lease), a, 5, 10).is_some());
        assert!(Lease::renewal(Some(&lease), a, 10, 10).is_none());
        assert!(Lease::renewal(Some(&lease), Uuid::new_v4(), 5, 10).is_none());
        assert!(Lease::renewal(None, a, 5, 10).is_none());
    }
}
