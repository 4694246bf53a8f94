use super::super::*;
use crate::craps::{apply_emergency, disburse, Disbursement};
use crapsvault_types::craps::{checked_add, ArithmeticError, EmergencyKind, EncodingError};
use tracing::info;

impl<'a, S: State> Layer<'a, S> {
    // === Treasury Handlers ===

    /// Move tokens from the caller's balance into the treasury.
    pub(in crate::layer) async fn handle_deposit(
        &mut self,
        public: &PublicKey,
        amount: u64,
    ) -> Handled {
        if amount == 0 {
            return Err(EncodingError::InvalidAmount(amount).into());
        }
        let balance = self.balance(public).await;
        if balance < amount {
            return Err(ArithmeticError::InsufficientBalance {
                available: balance,
                required: amount,
            }
            .into());
        }
        let mut treasury = self.treasury().await?;
        treasury.total_deposits = checked_add(treasury.total_deposits, amount, "total_deposits")?;

        info!(player = ?public, amount, "deposited");
        self.insert(
            Key::Balance(public.clone()),
            Value::Balance(balance - amount),
        );
        self.insert(Key::Treasury, Value::Treasury(treasury));
        Ok(vec![Event::Deposited {
            player: public.clone(),
            amount,
        }])
    }

    pub(in crate::layer) async fn handle_withdraw(
        &mut self,
        public: &PublicKey,
        amount: u64,
    ) -> Handled {
        if amount == 0 {
            return Err(EncodingError::InvalidAmount(amount).into());
        }
        let mut treasury = self.authorized_treasury(public, "withdraw").await?;
        disburse(&mut treasury, amount, self.now, Disbursement::Withdrawal)?;
        let balance = checked_add(self.balance(public).await, amount, "authority balance")?;

        info!(authority = ?public, amount, "withdrew from treasury");
        self.insert(Key::Treasury, Value::Treasury(treasury));
        self.insert(Key::Balance(public.clone()), Value::Balance(balance));
        Ok(vec![Event::Withdrawn {
            authority: public.clone(),
            amount,
        }])
    }

    pub(in crate::layer) async fn handle_emergency(
        &mut self,
        public: &PublicKey,
        kind: &EmergencyKind,
    ) -> Handled {
        let mut treasury = self.treasury().await?;
        apply_emergency(&mut treasury, public, kind)?;

        warn!(authority = ?public, ?kind, "applied emergency operation");
        self.insert(Key::Treasury, Value::Treasury(treasury));
        Ok(vec![Event::EmergencyApplied { kind: kind.clone() }])
    }
}
