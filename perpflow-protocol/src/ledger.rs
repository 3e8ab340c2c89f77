//! In-memory reference ledger: a finalizer and position lookup for tests and
//! the demo binary. Not a persistence layer.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

use perpflow_core::{verify, Digest, Lifecycle, Position, PublicKey, StateAndRef, StateRef};

use crate::error::{FinalizationError, LookupError};
use crate::ports::{Finalizer, PositionLookup, Receipt};
use crate::signed::FullySignedProposal;

#[derive(Debug, Clone, PartialEq)]
struct Record {
    position: Position,
    lifecycle: Lifecycle,
    consumed_by: Option<Digest>,
}

#[derive(Debug, Default)]
struct Book {
    records: BTreeMap<StateRef, Record>,
    committed: BTreeSet<Digest>,
}

impl Book {
    fn unconsumed(&self) -> impl Iterator<Item = (&StateRef, &Record)> {
        self.records.iter().filter(|(_, r)| r.consumed_by.is_none())
    }
}

/// Thread-safe ledger that commits a proposal atomically or not at all.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    book: RwLock<Book>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every position not yet consumed, in reference order.
    pub fn unconsumed(&self) -> Vec<StateAndRef> {
        self.read()
            .unconsumed()
            .map(|(reference, r)| StateAndRef {
                reference: *reference,
                position: r.position.clone(),
            })
            .collect()
    }

    /// Lifecycle of a committed position. A position consumed by `Close`
    /// reports `Closed`.
    pub fn lifecycle(&self, reference: &StateRef) -> Option<Lifecycle> {
        self.read().records.get(reference).map(|r| r.lifecycle)
    }

    pub fn is_consumed(&self, reference: &StateRef) -> bool {
        self.read()
            .records
            .get(reference)
            .is_some_and(|r| r.consumed_by.is_some())
    }

    pub fn committed_count(&self) -> usize {
        self.read().committed.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, Book> {
        self.book.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Book> {
        self.book.write().unwrap_or_else(|p| p.into_inner())
    }
}

impl PositionLookup for InMemoryLedger {
    fn find_unconsumed(&self, ticker: &str, taker: &PublicKey) -> Result<StateAndRef, LookupError> {
        self.read()
            .unconsumed()
            .find(|(_, r)| r.position.ticker == ticker && r.position.taker.key == *taker)
            .map(|(reference, r)| StateAndRef {
                reference: *reference,
                position: r.position.clone(),
            })
            .ok_or_else(|| LookupError::NotFound {
                ticker: ticker.to_string(),
                taker: *taker,
            })
    }
}

impl Finalizer for InMemoryLedger {
    fn submit(&self, tx: FullySignedProposal) -> Result<Receipt, FinalizationError> {
        tx.verify()?;
        let proposal = tx.proposal();
        verify(proposal)?;
        let id = tx.id();
        let kind = proposal.command.kind();

        // Every check below and the commit happen under one write lock.
        let mut book = self.write();
        if book.committed.contains(&id) {
            return Err(FinalizationError::AlreadyCommitted(id));
        }

        let mut consumed = Vec::with_capacity(proposal.inputs.len());
        let mut next = None;
        for input in &proposal.inputs {
            let record = book
                .records
                .get(&input.reference)
                .ok_or(FinalizationError::UnknownInput(input.reference))?;
            if record.consumed_by.is_some() {
                return Err(FinalizationError::DoubleSpend(input.reference));
            }
            if record.position != input.position {
                return Err(FinalizationError::InputMismatch(input.reference));
            }
            next = Some(record.lifecycle.apply(kind)?);
            consumed.push(input.reference);
        }
        let next = match next {
            Some(state) => state,
            None => Lifecycle::create(kind)?,
        };

        for output in &proposal.outputs {
            let clash = book.unconsumed().any(|(reference, r)| {
                !consumed.contains(reference)
                    && r.position.ticker == output.ticker
                    && r.position.taker == output.taker
            });
            if clash {
                return Err(FinalizationError::DuplicatePosition {
                    ticker: output.ticker.clone(),
                    taker: output.taker.key,
                });
            }
        }

        for reference in &consumed {
            if let Some(record) = book.records.get_mut(reference) {
                record.consumed_by = Some(id);
                if next.is_terminal() {
                    record.lifecycle = next;
                }
            }
        }
        let mut created = Vec::with_capacity(proposal.outputs.len());
        for (index, output) in proposal.outputs.iter().enumerate() {
            let reference = StateRef::new(id, index as u32);
            book.records.insert(
                reference,
                Record {
                    position: output.clone(),
                    lifecycle: next,
                    consumed_by: None,
                },
            );
            created.push(reference);
        }
        book.committed.insert(id);

        info!(
            proposal = %id.short(),
            %kind,
            consumed = consumed.len(),
            created = created.len(),
            "committed"
        );
        Ok(Receipt { id, consumed, created })
    }
}
