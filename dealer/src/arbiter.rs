use std::sync::Arc;

use crossbeam_channel::{select, Receiver, Sender};
use parking_lot::RwLock;
use setgame::{Card, PlayerId, RuleOracle, Slot};
use tracing::debug;

use crate::{Shutdown, Table};

/// The outcome of [`ClaimArbiter::submit_claim`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimVerdict {
    /// The cards were removed from the table. The player earns a point.
    Accepted,
    /// The cards do not form a combination. The player is penalized.
    Rejected,
    /// The player's tokens changed before the claim was looked at, so there
    /// was nothing to verify.
    Stale,
    /// The game ended while the claim was pending.
    Interrupted,
}

/// Asks the dealer to take a verified combination off the table.
///
/// The claimant blocks until [`reply()`](Self::reply) is called.
pub struct RemovalRequest {
    pub player: PlayerId,
    pub slots: Vec<Slot>,
    pub cards: Vec<Card>,
    reply: Sender<bool>,
}

impl RemovalRequest {
    /// `applied` is false if the board changed since the claim was verified.
    pub fn reply(self, applied: bool) {
        // The claimant is gone only if the game is shutting down
        let _ = self.reply.send(applied);
    }
}

/// Lets one claim at a time be verified.
///
/// Admission is a single permit passed around through a channel, so waiting
/// for it can be cut short by the shutdown. The permit is held until the
/// dealer has removed the cards of an accepted claim, which means the next
/// claim always sees the board after that removal.
pub struct ClaimArbiter {
    permit_tx: Sender<()>,
    permit_rx: Receiver<()>,
    removals: Sender<RemovalRequest>,
    table: Arc<Table>,
    rules: Arc<dyn RuleOracle>,
    dealing: Arc<RwLock<()>>,
    shutdown: Shutdown,
}

/// Puts the permit back when dropped.
struct Permit<'a> {
    permit_tx: &'a Sender<()>,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        let _ = self.permit_tx.try_send(());
    }
}

impl ClaimArbiter {
    /// Also returns the channel on which the dealer receives removal requests.
    pub fn new(
        table: Arc<Table>,
        rules: Arc<dyn RuleOracle>,
        dealing: Arc<RwLock<()>>,
        shutdown: Shutdown,
    ) -> (Self, Receiver<RemovalRequest>) {
        let (permit_tx, permit_rx) = crossbeam_channel::bounded(1);
        let _ = permit_tx.send(());
        let (removals, removals_rx) = crossbeam_channel::bounded(1);
        let arbiter = Self {
            permit_tx,
            permit_rx,
            removals,
            table,
            rules,
            dealing,
            shutdown,
        };
        (arbiter, removals_rx)
    }

    fn admit(&self) -> Option<Permit<'_>> {
        select! {
            recv(self.permit_rx) -> permit => permit.ok()?,
            recv(self.shutdown.signal()) -> _ => return None,
        }
        let permit = Permit {
            permit_tx: &self.permit_tx,
        };
        (!self.shutdown.is_triggered()).then_some(permit)
    }

    /// Called by a player whose tokens just reached the combination size.
    ///
    /// Blocks while another claim is being verified, and, if the claim is
    /// valid, until the dealer has taken the cards off the table.
    pub fn submit_claim(&self, player: PlayerId) -> ClaimVerdict {
        let Some(_permit) = self.admit() else {
            return ClaimVerdict::Interrupted;
        };

        let (slots, cards) = {
            // Wait for the dealer to finish dealing
            let _dealing = self.dealing.read();
            match self.table.claim_snapshot(player) {
                (slots, Some(cards)) if slots.len() == self.rules.combination_size() => {
                    (slots, cards)
                }
                (slots, _) => {
                    debug!(player, tokens = slots.len(), "Dropping stale claim");
                    return ClaimVerdict::Stale;
                }
            }
        };

        if !self.rules.is_valid_combination(&cards) {
            debug!(player, ?slots, "Claim rejected");
            return ClaimVerdict::Rejected;
        }

        let (reply, reply_rx) = crossbeam_channel::bounded(1);
        let request = RemovalRequest {
            player,
            slots,
            cards,
            reply,
        };
        select! {
            send(self.removals, request) -> res => {
                if res.is_err() {
                    return ClaimVerdict::Interrupted;
                }
            }
            recv(self.shutdown.signal()) -> _ => return ClaimVerdict::Interrupted,
        }
        select! {
            recv(reply_rx) -> applied => match applied {
                Ok(true) => {
                    debug!(player, "Claim accepted");
                    ClaimVerdict::Accepted
                }
                Ok(false) => {
                    debug!(player, "Claim went stale before removal");
                    ClaimVerdict::Stale
                }
                Err(_) => ClaimVerdict::Interrupted,
            },
            recv(self.shutdown.signal()) -> _ => ClaimVerdict::Interrupted,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use setgame::{Deck, SetRules};

    use super::*;
    use crate::Recorder;

    struct Fixture {
        table: Arc<Table>,
        arbiter: Arc<ClaimArbiter>,
        removals: Receiver<RemovalRequest>,
        dealing: Arc<RwLock<()>>,
        shutdown: Shutdown,
    }

    /// Cards 0, 1, 2 form a combination, 0, 1, 4 do not.
    fn fixture(cards: &[u32], num_players: usize) -> Fixture {
        let recorder = Arc::new(Recorder::new());
        let table = Arc::new(Table::new(cards.len(), num_players, recorder));
        // fill() draws from the back
        let mut deck = Deck::from_cards(cards.iter().rev().map(|&c| Card(c)));
        table.fill(&mut deck);
        let dealing = Arc::new(RwLock::new(()));
        let shutdown = Shutdown::new();
        let (arbiter, removals) = ClaimArbiter::new(
            table.clone(),
            Arc::new(SetRules::new(3, 4)),
            dealing.clone(),
            shutdown.clone(),
        );
        Fixture {
            table,
            arbiter: Arc::new(arbiter),
            removals,
            dealing,
            shutdown,
        }
    }

    /// Answers removal requests like the dealer does, counting removals.
    fn serve_removals(
        table: Arc<Table>,
        removals: Receiver<RemovalRequest>,
        removed: Arc<AtomicUsize>,
    ) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            while let Ok(request) = removals.recv() {
                let applied = table.take_claimed(request.player, &request.slots, &request.cards);
                if applied {
                    removed.fetch_add(1, Ordering::SeqCst);
                }
                request.reply(applied);
            }
        })
    }

    #[test]
    fn valid_claim_is_removed_before_accepting() {
        let f = fixture(&[0, 1, 2, 4], 1);
        for slot in 0..3 {
            f.table.place_token(0, slot);
        }
        let removed = Arc::new(AtomicUsize::new(0));
        let dealer = serve_removals(f.table.clone(), f.removals, removed.clone());

        assert_eq!(f.arbiter.submit_claim(0), ClaimVerdict::Accepted);
        assert_eq!(removed.load(Ordering::SeqCst), 1);
        assert_eq!(f.table.cards(), vec![Card(4)]);
        assert!(f.table.tokens_of_player(0).is_empty());

        drop(f.arbiter);
        dealer.join().unwrap();
    }

    #[test]
    fn invalid_claim_leaves_the_board_alone() {
        let f = fixture(&[0, 1, 2, 4], 1);
        for slot in [0, 1, 3] {
            f.table.place_token(0, slot);
        }
        assert_eq!(f.arbiter.submit_claim(0), ClaimVerdict::Rejected);
        assert_eq!(f.table.count_cards(), 4);
        assert_eq!(f.table.tokens_of_player(0), vec![0, 1, 3]);
        assert!(f.removals.try_recv().is_err());
    }

    #[test]
    fn shrunken_token_set_is_stale() {
        let f = fixture(&[0, 1, 2], 1);
        for slot in 0..3 {
            f.table.place_token(0, slot);
        }
        // The dealer took a card away in the meantime
        f.table.remove_card(2);
        assert_eq!(f.arbiter.submit_claim(0), ClaimVerdict::Stale);
        assert!(f.removals.try_recv().is_err());
    }

    #[test]
    fn board_reset_between_verification_and_removal_is_stale() {
        let f = fixture(&[0, 1, 2], 1);
        for slot in 0..3 {
            f.table.place_token(0, slot);
        }
        let table = f.table.clone();
        let dealer = thread::spawn(move || {
            let request = f.removals.recv().unwrap();
            // A timeout reset wins the race against the claim
            let cards = table.take_all_cards();
            table.fill(&mut Deck::from_cards(cards));
            let applied = table.take_claimed(request.player, &request.slots, &request.cards);
            request.reply(applied);
        });
        assert_eq!(f.arbiter.submit_claim(0), ClaimVerdict::Stale);
        dealer.join().unwrap();
        assert_eq!(f.table.count_cards(), 3);
    }

    #[test]
    fn claim_waits_for_dealing_to_finish() {
        let f = fixture(&[0, 1, 2], 1);
        for slot in 0..3 {
            f.table.place_token(0, slot);
        }
        let removed = Arc::new(AtomicUsize::new(0));
        let dealer = serve_removals(f.table.clone(), f.removals, removed.clone());

        let dealing = f.dealing.write();
        let claimant = {
            let arbiter = f.arbiter.clone();
            thread::spawn(move || arbiter.submit_claim(0))
        };
        thread::sleep(Duration::from_millis(30));
        assert_eq!(removed.load(Ordering::SeqCst), 0);
        // The dealer clears the table while holding the dealing lock
        f.table.take_all_cards();
        drop(dealing);

        assert_eq!(claimant.join().unwrap(), ClaimVerdict::Stale);
        drop(f.arbiter);
        dealer.join().unwrap();
        assert_eq!(removed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn concurrent_claims_never_share_slots() {
        // Everyone goes for the same combination, only one can get it
        let num_players = 6;
        let f = fixture(&[0, 1, 2], num_players);
        for player in 0..num_players {
            for slot in 0..3 {
                f.table.place_token(player, slot);
            }
        }
        let removed = Arc::new(AtomicUsize::new(0));
        let dealer = serve_removals(f.table.clone(), f.removals, removed.clone());

        let claimants: Vec<_> = (0..num_players)
            .map(|player| {
                let arbiter = f.arbiter.clone();
                thread::spawn(move || arbiter.submit_claim(player))
            })
            .collect();
        let verdicts: Vec<ClaimVerdict> = claimants.into_iter().map(|c| c.join().unwrap()).collect();

        let accepted = verdicts.iter().filter(|&&v| v == ClaimVerdict::Accepted).count();
        assert_eq!(accepted, 1);
        assert_eq!(removed.load(Ordering::SeqCst), 1);
        assert!(verdicts
            .iter()
            .all(|&v| v == ClaimVerdict::Accepted || v == ClaimVerdict::Stale));
        assert!(f.table.snapshot().is_consistent());

        drop(f.arbiter);
        dealer.join().unwrap();
    }

    #[test]
    fn shutdown_interrupts_a_pending_claim() {
        let f = fixture(&[0, 1, 2], 1);
        for slot in 0..3 {
            f.table.place_token(0, slot);
        }
        // Nobody serves the removal request
        let claimant = {
            let arbiter = f.arbiter.clone();
            thread::spawn(move || arbiter.submit_claim(0))
        };
        thread::sleep(Duration::from_millis(30));
        f.shutdown.trigger();
        assert_eq!(claimant.join().unwrap(), ClaimVerdict::Interrupted);
        assert_eq!(f.table.count_cards(), 3);
        drop(f.removals);
    }
}
