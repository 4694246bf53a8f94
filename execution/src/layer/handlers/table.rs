use super::super::*;
use crate::craps::{
    advance_table, close_betting, collect_entropy_source, finalize, start_betting_phase,
};
use crapsvault_types::craps::EntropySource;
use tracing::{debug, info};

impl<'a, S: State> Layer<'a, S> {
    // === Randomness Handlers ===

    pub(in crate::layer) async fn handle_start_betting(&mut self, public: &PublicKey) -> Handled {
        let mut treasury = self.authorized_treasury(public, "start betting").await?;
        let previous = self.rng_state().await;
        let rng = start_betting_phase(previous.as_ref(), self.now);

        // A new epoch re-bases the reserve floor
        if previous.as_ref().map(|p| p.epoch) != Some(rng.epoch) {
            treasury.epoch_start_balance = treasury.balance()?;
            self.insert(Key::Treasury, Value::Treasury(treasury));
        }
        if previous.is_none() {
            self.insert(Key::Table, Value::Table(Table::default()));
        }

        info!(epoch = rng.epoch, started_at = self.now, "betting open");
        let event = Event::BettingStarted {
            epoch: rng.epoch,
            started_at: self.now,
        };
        self.insert(Key::Rng, Value::Rng(rng));
        Ok(vec![event])
    }

    pub(in crate::layer) async fn handle_close_betting(&mut self, public: &PublicKey) -> Handled {
        self.authorized_treasury(public, "close betting").await?;
        let mut rng = self.current_rng().await?;
        close_betting(&mut rng, self.now)?;

        info!(epoch = rng.epoch, "betting closed");
        let event = Event::BettingClosed { epoch: rng.epoch };
        self.insert(Key::Rng, Value::Rng(rng));
        Ok(vec![event])
    }

    pub(in crate::layer) async fn handle_collect_entropy(
        &mut self,
        public: &PublicKey,
        source: EntropySource,
    ) -> Handled {
        self.authorized_treasury(public, "collect entropy").await?;
        let mut rng = self.current_rng().await?;
        let count = collect_entropy_source(&mut rng, source)?;

        debug!(epoch = rng.epoch, slot = source.slot, count, "collected entropy");
        let event = Event::EntropyCollected {
            epoch: rng.epoch,
            slot: source.slot,
            count,
        };
        self.insert(Key::Rng, Value::Rng(rng));
        Ok(vec![event])
    }

    pub(in crate::layer) async fn handle_finalize_rng(
        &mut self,
        public: &PublicKey,
        required: u8,
    ) -> Handled {
        self.authorized_treasury(public, "finalize rng").await?;
        let mut rng = self.current_rng().await?;
        let (die1, die2) = finalize(&mut rng, &self.config, required)?;

        let mut table = self.table().await;
        let (phase, point) = (table.phase, table.point);
        let (event, bonus) = advance_table(&mut table, die1, die2);
        let outcome = EpochOutcome {
            epoch: rng.epoch,
            die1,
            die2,
            phase,
            point,
            event,
            bonus,
            finalized_at: self.now,
        };

        info!(
            epoch = rng.epoch,
            die1,
            die2,
            sources = rng.hash_count(),
            ?event,
            "finalized roll"
        );
        self.insert(Key::Outcome(rng.epoch), Value::Outcome(outcome));
        self.insert(Key::Table, Value::Table(table));
        self.insert(Key::Rng, Value::Rng(rng));
        Ok(vec![Event::RngFinalized { outcome }])
    }
}
