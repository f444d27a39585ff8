//! Allow/deny decision with duplicate-block debounce.
//!
//! Pure domain logic apart from the whitelist read.

use crate::state::BlockMemo;
use kiosk_whitelist::{PackageId, WhitelistError, WhitelistStoreRef};
use serde::{Deserialize, Serialize};

/// Why a foreground package did not trigger a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowReason {
    /// Launcher, system UI or the kiosk itself.
    System,
    /// Present in the user whitelist.
    Whitelisted,
    /// Not permitted, but blocked inside the debounce window already.
    RecentlyBlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "verdict", content = "reason")]
pub enum Verdict {
    Allow(AllowReason),
    Deny,
}

/// Maps a foreground package to a [`Verdict`].
///
/// Owns the [`BlockMemo`]; only the polling thread touches it.
pub struct DecisionEngine {
    store: WhitelistStoreRef,
    memo: BlockMemo,
    debounce_ms: i64,
}

impl DecisionEngine {
    pub fn new(store: WhitelistStoreRef, debounce_ms: i64) -> Self {
        Self {
            store,
            memo: BlockMemo::default(),
            debounce_ms,
        }
    }

    pub fn memo(&self) -> &BlockMemo {
        &self.memo
    }

    pub fn reset(&mut self) {
        self.memo.clear();
    }

    /// Decide for `package` at `now_ms`. A `Deny` records the block in the memo.
    ///
    /// Whitelist membership is read from the store on every call.
    pub fn decide(&mut self, package: &PackageId, now_ms: i64) -> Result<Verdict, WhitelistError> {
        if self.store.system().contains(package) {
            tracing::trace!(package = %package, "system package allowed");
            return Ok(Verdict::Allow(AllowReason::System));
        }

        if self.store.is_allowed(package)? {
            tracing::trace!(package = %package, "whitelisted package allowed");
            return Ok(Verdict::Allow(AllowReason::Whitelisted));
        }

        if self.memo.is_recent(package, now_ms, self.debounce_ms) {
            tracing::debug!(
                package = %package,
                since_ms = now_ms - self.memo.last_blocked_at_ms,
                "block already in effect"
            );
            return Ok(Verdict::Allow(AllowReason::RecentlyBlocked));
        }

        self.memo.record(package.clone(), now_ms);
        Ok(Verdict::Deny)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_whitelist::{
        InMemoryWhitelist, SystemAllowlist, WhitelistEditor, SYSTEM_PACKAGES,
    };
    use std::sync::Arc;

    fn engine_with(user: &[&str]) -> (DecisionEngine, Arc<InMemoryWhitelist>) {
        let store = Arc::new(InMemoryWhitelist::with_user(
            SystemAllowlist::new(PackageId::from("com.kiosk.kioskmode")),
            user.iter().copied(),
        ));
        (DecisionEngine::new(store.clone(), 2_000), store)
    }

    #[test]
    fn test_system_packages_always_allowed() {
        let (mut engine, store) = engine_with(&["com.maps.app"]);
        for id in SYSTEM_PACKAGES.iter().chain(["com.kiosk.kioskmode"].iter()) {
            let verdict = engine.decide(&PackageId::from(*id), 1_000).unwrap();
            assert_eq!(verdict, Verdict::Allow(AllowReason::System));
        }

        store.clear().unwrap();
        let verdict = engine.decide(&PackageId::from("com.android.systemui"), 1_000).unwrap();
        assert_eq!(verdict, Verdict::Allow(AllowReason::System));
    }

    #[test]
    fn test_deny_then_suppress_then_deny_again() {
        let (mut engine, _) = engine_with(&[]);
        let other = PackageId::from("com.other.app");

        assert_eq!(engine.decide(&other, 10_000).unwrap(), Verdict::Deny);
        assert_eq!(engine.memo().last_blocked.as_ref(), Some(&other));
        assert_eq!(engine.memo().last_blocked_at_ms, 10_000);

        assert_eq!(
            engine.decide(&other, 11_999).unwrap(),
            Verdict::Allow(AllowReason::RecentlyBlocked)
        );
        // Suppression does not refresh the memo
        assert_eq!(engine.memo().last_blocked_at_ms, 10_000);

        assert_eq!(engine.decide(&other, 12_000).unwrap(), Verdict::Deny);
        assert_eq!(engine.memo().last_blocked_at_ms, 12_000);
    }

    #[test]
    fn test_different_package_not_debounced() {
        let (mut engine, _) = engine_with(&[]);
        assert_eq!(engine.decide(&PackageId::from("com.a.app"), 1_000).unwrap(), Verdict::Deny);
        assert_eq!(engine.decide(&PackageId::from("com.b.app"), 1_100).unwrap(), Verdict::Deny);
        assert_eq!(engine.decide(&PackageId::from("com.a.app"), 1_200).unwrap(), Verdict::Deny);
    }

    #[test]
    fn test_reads_whitelist_fresh_each_call() {
        let (mut engine, store) = engine_with(&[]);
        let maps = PackageId::from("com.maps.app");

        assert_eq!(engine.decide(&maps, 1_000).unwrap(), Verdict::Deny);
        store.add(&maps).unwrap();
        assert_eq!(
            engine.decide(&maps, 1_100).unwrap(),
            Verdict::Allow(AllowReason::Whitelisted)
        );
        store.remove(&maps).unwrap();
        assert_eq!(engine.decide(&maps, 5_000).unwrap(), Verdict::Deny);
    }

    #[test]
    fn test_empty_whitelist_denies_everything_but_system() {
        let (mut engine, _) = engine_with(&[]);
        for (i, id) in ["com.maps.app", "com.dialer.app", "com.browser.app"].iter().enumerate() {
            let verdict = engine.decide(&PackageId::from(*id), i as i64 * 10).unwrap();
            assert_eq!(verdict, Verdict::Deny, "{id} should be denied");
        }
    }

    #[test]
    fn test_reset_clears_memo() {
        let (mut engine, _) = engine_with(&[]);
        let other = PackageId::from("com.other.app");
        engine.decide(&other, 1_000).unwrap();
        engine.reset();
        assert_eq!(engine.decide(&other, 1_100).unwrap(), Verdict::Deny);
    }

    #[test]
    fn test_verdict_serialization() {
        let json = serde_json::to_string(&Verdict::Allow(AllowReason::RecentlyBlocked)).unwrap();
        assert_eq!(json, r#"{"verdict":"allow","reason":"recently_blocked"}"#);
        assert_eq!(serde_json::to_string(&Verdict::Deny).unwrap(), r#"{"verdict":"deny"}"#);
    }
}
