use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};

use vigil_common::{
    ChannelPermissions, Error, HistoryMessage, InviteUsage, PermissionOverride, PlatformAdapter,
    Result,
};

/// In-memory platform stand-in for ledger tests. Only the invite listing is
/// interesting; the channel-facing calls are inert.
#[derive(Default)]
pub struct MockAdapter {
    invites: Mutex<Vec<InviteUsage>>,
    fail_listing: Mutex<bool>,
    listing_delay: Mutex<Duration>,
    listings_in_flight: AtomicUsize,
    max_listings_in_flight: AtomicUsize,
}

impl MockAdapter {
    pub fn set_invites(&self, invites: &[(&str, u64, Option<&str>)]) {
        *self.invites.lock().unwrap() = invites
            .iter()
            .map(|(code, uses, inviter)| InviteUsage {
                code: code.to_string(),
                uses: *uses,
                inviter_id: inviter.map(str::to_string),
            })
            .collect();
    }

    pub fn fail_listing(&self, fail: bool) {
        *self.fail_listing.lock().unwrap() = fail;
    }

    /// Make every `list_invites` call take this long, widening the window
    /// in which concurrent callers could overlap.
    pub fn set_listing_delay(&self, delay: Duration) {
        *self.listing_delay.lock().unwrap() = delay;
    }

    /// Highest number of `list_invites` calls ever observed in flight at
    /// the same time.
    pub fn max_concurrent_listings(&self) -> usize {
        self.max_listings_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformAdapter for MockAdapter {
    async fn list_invites(&self, _community_id: &str) -> Result<Vec<InviteUsage>> {
        let in_flight = self.listings_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_listings_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);

        let delay = *self.listing_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = if *self.fail_listing.lock().unwrap() {
            Err(Error::adapter_unavailable("invite listing disabled"))
        } else {
            Ok(self.invites.lock().unwrap().clone())
        };
        self.listings_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn create_isolated_channel(
        &self,
        _community_id: &str,
        _name: &str,
        _overrides: &[PermissionOverride],
    ) -> Result<String> {
        Err(Error::adapter_unavailable("not supported by this mock"))
    }

    async fn delete_channel(&self, _channel_id: &str) -> Result<()> {
        Ok(())
    }

    async fn fetch_channel_history(
        &self,
        _channel_id: &str,
    ) -> Result<BoxStream<'static, HistoryMessage>> {
        Ok(stream::iter(Vec::new()).boxed())
    }

    async fn member_roles(
        &self,
        _community_id: &str,
        _member_id: &str,
    ) -> Result<HashSet<String>> {
        Ok(HashSet::new())
    }

    async fn send_message(&self, _channel_id: &str, _content: &str) -> Result<()> {
        Ok(())
    }

    async fn pin_last_message(&self, _channel_id: &str) -> Result<()> {
        Ok(())
    }

    async fn set_member_overwrite(
        &self,
        _channel_id: &str,
        _member_id: &str,
        _permissions: Option<ChannelPermissions>,
    ) -> Result<()> {
        Ok(())
    }
}
