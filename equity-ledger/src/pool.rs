//! Stock pool ledger: one balance plus an append-only transaction history.
//!
//! Invariant: `balance == total_capacity + sum(deltas)` after every post.

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::error::{EquityError, Result};
use crate::types::{PoolTransaction, TransactionKind};

/// Largest capacity the signed balance can represent.
pub const MAX_CAPACITY: u64 = i64::MAX as u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockPool {
    total_capacity: u64,
    balance: i64,
    transactions: Vec<PoolTransaction>,
}

impl StockPool {
    /// A freshly initialized pool with a single `Initialize` entry.
    pub fn new(total_capacity: u64) -> Result<Self> {
        let mut pool = Self {
            total_capacity: 0,
            balance: 0,
            transactions: Vec::new(),
        };
        pool.initialize(total_capacity, 0)?;
        Ok(pool)
    }

    /// Rebuild from imported parts, checking replay consistency.
    pub(crate) fn from_parts(
        total_capacity: u64,
        transactions: Vec<PoolTransaction>,
        balance: Option<i64>,
    ) -> Result<Self> {
        let as_import = |e: EquityError| match e {
            EquityError::Validation(msg) => EquityError::import(msg),
            other => other,
        };
        signed(total_capacity).map_err(as_import)?;
        let pool = Self {
            total_capacity,
            balance: 0,
            transactions,
        };
        let replayed = pool.replay_balance().map_err(as_import)?;
        if let Some(balance) = balance {
            if balance != replayed {
                return Err(EquityError::import(format!(
                    "pool balance {balance} does not match replayed balance {replayed}"
                )));
            }
        }
        let pool = Self {
            balance: replayed,
            ..pool
        };
        pool.verify_history().map_err(as_import)?;
        Ok(pool)
    }

    /// Reset capacity and history.
    ///
    /// `outstanding` is the share count still held by active grants; it is
    /// carried into the new pool as a debit so the balance reflects it.
    /// Capacities above `MAX_CAPACITY` are rejected and leave the pool as it was.
    pub fn initialize(&mut self, total_capacity: u64, outstanding: u64) -> Result<()> {
        let capacity = signed(total_capacity)?;
        let carried = signed(outstanding)?;

        self.total_capacity = total_capacity;
        self.balance = capacity;
        self.transactions.clear();
        self.post(
            TransactionKind::Initialize,
            format!("Pool initialized with {total_capacity} shares"),
            0,
        )?;
        if carried > 0 {
            self.post(
                TransactionKind::Carryover,
                format!("Carried over {outstanding} shares held by active grants"),
                -carried,
            )?;
        }
        Ok(())
    }

    /// Fail with `InsufficientPool` unless `shares` fit in the balance.
    pub fn ensure_available(&self, shares: u64) -> Result<()> {
        if i64::try_from(shares).map_or(true, |s| s > self.balance) {
            return Err(EquityError::InsufficientPool {
                requested: shares,
                available: self.balance,
            });
        }
        Ok(())
    }

    /// Fail unless crediting `shares` keeps the balance in range.
    pub fn ensure_creditable(&self, shares: u64) -> Result<()> {
        let delta = signed(shares)?;
        self.apply(delta).map(|_| ())
    }

    fn apply(&self, delta: i64) -> Result<i64> {
        self.balance.checked_add(delta).ok_or_else(|| {
            EquityError::validation(format!(
                "pool balance {} cannot absorb delta {delta}",
                self.balance
            ))
        })
    }

    /// Append a transaction and apply its delta. Nothing changes on overflow.
    pub(crate) fn post(
        &mut self,
        kind: TransactionKind,
        description: String,
        delta: i64,
    ) -> Result<&PoolTransaction> {
        self.balance = self.apply(delta)?;
        let seq = self.transactions.last().map(|t| t.seq + 1).unwrap_or(1);
        self.transactions.push(PoolTransaction {
            seq,
            timestamp: Utc::now(),
            kind,
            description,
            delta,
            balance_after: self.balance,
        });
        tracing::debug!(
            seq,
            kind = kind.as_str(),
            delta,
            balance = self.balance,
            "Posted pool transaction"
        );
        Ok(&self.transactions[self.transactions.len() - 1])
    }

    /// Debit shares for a grant. Callers check availability first.
    pub(crate) fn debit(&mut self, shares: u64, description: String) -> Result<&PoolTransaction> {
        let delta = signed(shares)?;
        self.post(TransactionKind::Grant, description, -delta)
    }

    /// Credit reclaimed shares back into the pool.
    pub(crate) fn credit(&mut self, shares: u64, description: String) -> Result<&PoolTransaction> {
        let delta = signed(shares)?;
        self.post(TransactionKind::Reclaim, description, delta)
    }

    /// Balance recomputed from capacity and history.
    pub fn replay_balance(&self) -> Result<i64> {
        let capacity = signed(self.total_capacity)?;
        self.transactions
            .iter()
            .try_fold(capacity, |acc, tx| acc.checked_add(tx.delta))
            .ok_or_else(|| EquityError::validation("pool history overflows the balance range"))
    }

    /// Check the running balances and sequence numbers in the history.
    pub fn verify_history(&self) -> Result<()> {
        let mut running = signed(self.total_capacity)?;
        let mut last_seq = 0;
        for tx in &self.transactions {
            if tx.seq <= last_seq {
                return Err(EquityError::validation(format!(
                    "transaction sequence not increasing at {}",
                    tx.seq
                )));
            }
            if tx.kind == TransactionKind::Initialize && tx.delta != 0 {
                return Err(EquityError::validation(format!(
                    "initialize transaction {} carries a delta",
                    tx.seq
                )));
            }
            running = running.checked_add(tx.delta).ok_or_else(|| {
                EquityError::validation(format!("transaction {} overflows the balance", tx.seq))
            })?;
            if tx.balance_after != running {
                return Err(EquityError::validation(format!(
                    "transaction {} records balance {} but replay gives {running}",
                    tx.seq, tx.balance_after
                )));
            }
            last_seq = tx.seq;
        }
        if running != self.balance {
            return Err(EquityError::validation(format!(
                "balance {} does not match replayed {running}",
                self.balance
            )));
        }
        Ok(())
    }

    /// SHA-256 over the ordered history, hex encoded.
    pub fn ledger_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.total_capacity.to_le_bytes());
        for tx in &self.transactions {
            hasher.update(tx.seq.to_le_bytes());
            hasher.update(tx.timestamp.timestamp_micros().to_le_bytes());
            hasher.update(tx.kind.as_str().as_bytes());
            hasher.update(tx.description.as_bytes());
            hasher.update(tx.delta.to_le_bytes());
            hasher.update(tx.balance_after.to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }

    pub fn total_capacity(&self) -> u64 {
        self.total_capacity
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn transactions(&self) -> &[PoolTransaction] {
        &self.transactions
    }

    /// Most recent transactions, newest first.
    pub fn recent(&self, limit: usize) -> Vec<&PoolTransaction> {
        self.transactions.iter().rev().take(limit).collect()
    }
}

fn signed(shares: u64) -> Result<i64> {
    i64::try_from(shares).map_err(|_| {
        EquityError::validation(format!(
            "{shares} shares exceeds the ledger maximum of {MAX_CAPACITY}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pool() {
        let pool = StockPool::new(5_000_000).unwrap();
        assert_eq!(pool.balance(), 5_000_000);
        assert_eq!(pool.transactions().len(), 1);
        assert_eq!(pool.transactions()[0].kind, TransactionKind::Initialize);
        assert_eq!(pool.transactions()[0].delta, 0);
        assert!(pool.verify_history().is_ok());
    }

    #[test]
    fn test_replay_invariant_over_sequence() {
        let mut pool = StockPool::new(100_000).unwrap();
        pool.debit(40_000, "grant a".into()).unwrap();
        pool.debit(20_000, "grant b".into()).unwrap();
        pool.credit(15_000, "reclaim a".into()).unwrap();
        pool.debit(5_000, "grant c".into()).unwrap();

        assert_eq!(pool.balance(), 50_000);
        assert_eq!(pool.balance(), pool.replay_balance().unwrap());
        assert!(pool.verify_history().is_ok());

        let seqs: Vec<u64> = pool.transactions().iter().map(|t| t.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
        assert_eq!(pool.recent(2)[0].seq, 5);
    }

    #[test]
    fn test_ensure_available() {
        let pool = StockPool::new(10_000).unwrap();
        assert!(pool.ensure_available(10_000).is_ok());
        assert_eq!(
            pool.ensure_available(10_001),
            Err(EquityError::InsufficientPool {
                requested: 10_001,
                available: 10_000
            })
        );
    }

    #[test]
    fn test_reinitialize_with_outstanding() {
        let mut pool = StockPool::new(100_000).unwrap();
        pool.debit(30_000, "grant".into()).unwrap();
        pool.initialize(200_000, 30_000).unwrap();

        assert_eq!(pool.total_capacity(), 200_000);
        assert_eq!(pool.balance(), 170_000);
        assert_eq!(pool.transactions().len(), 2);
        assert_eq!(pool.transactions()[1].kind, TransactionKind::Carryover);
        assert_eq!(pool.balance(), pool.replay_balance().unwrap());
    }

    #[test]
    fn test_from_parts_detects_tampering() {
        let mut pool = StockPool::new(100_000).unwrap();
        pool.debit(40_000, "grant".into()).unwrap();
        let txs = pool.transactions().to_vec();

        let rebuilt = StockPool::from_parts(100_000, txs.clone(), Some(60_000)).unwrap();
        assert_eq!(rebuilt, pool);
        assert_eq!(rebuilt.ledger_hash(), pool.ledger_hash());

        assert!(StockPool::from_parts(100_000, txs.clone(), Some(70_000)).is_err());

        let mut bad = txs;
        bad[1].balance_after = 1;
        assert!(matches!(
            StockPool::from_parts(100_000, bad, None),
            Err(EquityError::ImportFormat(_))
        ));
    }

    #[test]
    fn test_capacity_above_signed_range_rejected() {
        assert!(matches!(
            StockPool::new(MAX_CAPACITY + 1),
            Err(EquityError::Validation(_))
        ));
        assert!(StockPool::new(MAX_CAPACITY).is_ok());

        let mut pool = StockPool::new(1_000).unwrap();
        let before = pool.clone();
        assert!(pool.initialize(u64::MAX, 0).is_err());
        assert_eq!(pool, before);
    }

    #[test]
    fn test_post_overflow_leaves_pool_untouched() {
        let mut pool = StockPool::new(MAX_CAPACITY).unwrap();
        let before = pool.clone();

        assert!(pool.ensure_creditable(1).is_err());
        assert!(pool.credit(1, "reclaim".into()).is_err());
        assert_eq!(pool, before);
        assert!(pool.ensure_available(u64::MAX).is_err());
    }

    #[test]
    fn test_from_parts_rejects_overflowing_history() {
        let mut pool = StockPool::new(10).unwrap();
        pool.credit(5, "reclaim".into()).unwrap();
        let mut txs = pool.transactions().to_vec();
        txs[1].delta = i64::MAX;

        assert!(matches!(
            StockPool::from_parts(10, txs, None),
            Err(EquityError::ImportFormat(_))
        ));
        assert!(matches!(
            StockPool::from_parts(u64::MAX, Vec::new(), None),
            Err(EquityError::ImportFormat(_))
        ));
    }
}
