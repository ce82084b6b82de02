//! # Integration Test Flows
//!
//! Tests that the command service, the ledger and the shared-bus work together.
//!
//! ## Flows Tested:
//!
//! 1. **Harvest → Purchase**: full lifecycle through `CommandEnvelope`s
//! 2. **Rejections**: wrong role, wrong state, underpayment leave no trace
//! 3. **Live tail**: bus events arrive in log order, settlements alongside
//! 4. **Role registry**: grants and renouncements reach the bus

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, LedgerEvent};
    use supply_chain::prelude::*;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const ADMIN: Identity = Identity::repeat(0xad);
    const FARMER: Identity = Identity::repeat(0x01);
    const DISTRIBUTOR: Identity = Identity::repeat(0x02);
    const RETAILER: Identity = Identity::repeat(0x03);
    const CONSUMER: Identity = Identity::repeat(0x04);

    struct Harness {
        service: Arc<SupplyChainService>,
        bus: Arc<InMemoryEventBus>,
        funds: Arc<InMemoryFunds>,
    }

    impl Harness {
        async fn new() -> Self {
            Self::with_config(LedgerConfig::new(ADMIN)).await
        }

        async fn with_config(config: LedgerConfig) -> Self {
            let funds = Arc::new(InMemoryFunds::new());
            for account in [DISTRIBUTOR, CONSUMER] {
                funds.deposit(account, units(10)).unwrap();
            }
            let (ledger, bus) = SupplyChainLedger::with_event_bus(config, funds.clone());
            let harness = Self {
                service: Arc::new(SupplyChainService::new(Arc::new(ledger))),
                bus,
                funds,
            };
            harness
                .ok(ADMIN, LedgerCommand::AddDistributor { account: DISTRIBUTOR })
                .await;
            harness
                .ok(ADMIN, LedgerCommand::AddRetailer { account: RETAILER })
                .await;
            harness
        }

        async fn send(&self, caller: Identity, command: LedgerCommand) -> CommandResponse {
            let envelope = CommandEnvelope::new(caller, command);
            let correlation_id = envelope.correlation_id;
            let response = self.service.handle(envelope).await;
            assert_eq!(response.correlation_id, correlation_id);
            response
        }

        async fn ok(&self, caller: Identity, command: LedgerCommand) -> CommandResult {
            match self.send(caller, command.clone()).await.outcome {
                CommandOutcome::Ok { result } => result,
                CommandOutcome::Rejected { reason, .. } => {
                    panic!("{command:?} by {caller} rejected: {reason}")
                }
            }
        }

        async fn rejected(&self, caller: Identity, command: LedgerCommand) -> (ErrorKind, String) {
            match self.send(caller, command.clone()).await.outcome {
                CommandOutcome::Rejected { kind, reason } => (kind, reason),
                CommandOutcome::Ok { result } => panic!("{command:?} unexpectedly ok: {result:?}"),
            }
        }

        async fn state(&self, upc: Upc) -> ItemState {
            match self.ok(FARMER, LedgerCommand::FetchItemBufferTwo { upc }).await {
                CommandResult::BufferTwo(buffer) => buffer.state,
                other => panic!("unexpected result {other:?}"),
            }
        }

        async fn history(&self, upc: Upc) -> Vec<TransitionEvent> {
            match self.ok(FARMER, LedgerCommand::History { upc }).await {
                CommandResult::History(events) => events,
                other => panic!("unexpected result {other:?}"),
            }
        }

        async fn harvest(&self, upc: Upc) {
            self.ok(
                FARMER,
                LedgerCommand::HarvestItem {
                    upc,
                    details: details(),
                },
            )
            .await;
        }

        async fn to_for_sale(&self, upc: Upc, price: Amount) {
            self.harvest(upc).await;
            self.ok(FARMER, LedgerCommand::ProcessItem { upc }).await;
            self.ok(FARMER, LedgerCommand::PackItem { upc }).await;
            self.ok(FARMER, LedgerCommand::SellItem { upc, price }).await;
        }
    }

    fn details() -> HarvestDetails {
        HarvestDetails::new(
            "John Doe",
            "Yarray Valley",
            "-38.239770",
            "144.341490",
            "Best beans for Espresso",
        )
    }

    // =============================================================================
    // LIFECYCLE SCENARIOS
    // =============================================================================

    #[tokio::test]
    async fn test_harvest_records_custody_and_one_event() {
        let h = Harness::new().await;
        h.harvest(Upc(1)).await;

        let CommandResult::BufferOne(buffer) = h
            .ok(FARMER, LedgerCommand::FetchItemBufferOne { upc: Upc(1) })
            .await
        else {
            panic!("expected buffer one");
        };
        assert_eq!(buffer.sku, Sku(1));
        assert_eq!(buffer.upc, Upc(1));
        assert_eq!(buffer.owner_id, FARMER);
        assert_eq!(buffer.origin_farmer_id, FARMER);

        let history = h.history(Upc(1)).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, EventKind::Harvested);
    }

    #[tokio::test]
    async fn test_process_by_non_farmer_rejected() {
        let h = Harness::new().await;
        h.harvest(Upc(1)).await;

        let (kind, reason) = h
            .rejected(DISTRIBUTOR, LedgerCommand::ProcessItem { upc: Upc(1) })
            .await;
        assert_eq!(kind, ErrorKind::Unauthorized);
        assert_eq!(reason, "Only Farmer allowed");
        assert_eq!(h.state(Upc(1)).await, ItemState::Harvested);
    }

    #[tokio::test]
    async fn test_process_twice_rejected_on_state() {
        let h = Harness::new().await;
        h.harvest(Upc(1)).await;

        h.ok(FARMER, LedgerCommand::ProcessItem { upc: Upc(1) }).await;
        assert_eq!(h.state(Upc(1)).await, ItemState::Processed);

        let (kind, reason) = h
            .rejected(FARMER, LedgerCommand::ProcessItem { upc: Upc(1) })
            .await;
        assert_eq!(kind, ErrorKind::InvalidState);
        assert_eq!(reason, "Item must be harvested");
    }

    #[tokio::test]
    async fn test_buy_settles_price_and_refunds_excess() {
        let h = Harness::new().await;
        h.to_for_sale(Upc(1), units(1)).await;

        let CommandResult::Transition(receipt) = h
            .ok(
                DISTRIBUTOR,
                LedgerCommand::BuyItem {
                    upc: Upc(1),
                    payment: units(5),
                },
            )
            .await
        else {
            panic!("expected transition receipt");
        };

        assert_eq!(receipt.state(), ItemState::Sold);
        let settlement = receipt.settlement.unwrap();
        assert_eq!(settlement.recipient, FARMER);
        assert_eq!(settlement.price, units(1));
        assert_eq!(settlement.refund, units(4));

        assert_eq!(h.funds.balance_of(&FARMER), units(1));
        assert_eq!(h.funds.balance_of(&DISTRIBUTOR), units(9));

        let CommandResult::BufferTwo(buffer) = h
            .ok(FARMER, LedgerCommand::FetchItemBufferTwo { upc: Upc(1) })
            .await
        else {
            panic!("expected buffer two");
        };
        assert_eq!(buffer.distributor_id, Some(DISTRIBUTOR));
    }

    #[tokio::test]
    async fn test_underpayment_moves_nothing() {
        let h = Harness::new().await;
        h.to_for_sale(Upc(1), units(1)).await;
        let mut settlements = h
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Settlement]));

        let (kind, _) = h
            .rejected(
                DISTRIBUTOR,
                LedgerCommand::BuyItem {
                    upc: Upc(1),
                    payment: milli_units(500),
                },
            )
            .await;

        assert_eq!(kind, ErrorKind::InsufficientFunds);
        assert_eq!(h.state(Upc(1)).await, ItemState::ForSale);
        assert_eq!(h.funds.balance_of(&FARMER), Amount::zero());
        assert_eq!(h.funds.balance_of(&DISTRIBUTOR), units(10));
        assert_eq!(settlements.try_recv().unwrap(), None);
    }

    #[tokio::test]
    async fn test_full_chain_eight_events_in_order() {
        let h = Harness::new().await;
        let upc = Upc(1);
        let mut tail = h.bus.subscribe(EventFilter::topics(vec![
            EventTopic::ItemLifecycle,
            EventTopic::Settlement,
        ]));

        h.to_for_sale(upc, units(1)).await;
        h.ok(
            DISTRIBUTOR,
            LedgerCommand::BuyItem {
                upc,
                payment: units(1),
            },
        )
        .await;
        h.ok(DISTRIBUTOR, LedgerCommand::ShipItem { upc }).await;
        h.ok(RETAILER, LedgerCommand::ReceiveItem { upc }).await;
        h.ok(
            CONSUMER,
            LedgerCommand::PurchaseItem {
                upc,
                payment: units(2),
            },
        )
        .await;

        let kinds: Vec<EventKind> = h.history(upc).await.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::Harvested,
                EventKind::Processed,
                EventKind::Packed,
                EventKind::ForSale,
                EventKind::Sold,
                EventKind::Shipped,
                EventKind::Received,
                EventKind::Purchased,
            ]
        );

        let CommandResult::Item(snapshot) = h.ok(CONSUMER, LedgerCommand::FetchItem { upc }).await
        else {
            panic!("expected item snapshot");
        };
        assert_eq!(snapshot.buffer_one.owner_id, CONSUMER);
        assert_eq!(snapshot.buffer_two.consumer_id, Some(CONSUMER));
        assert_eq!(snapshot.buffer_two.retailer_id, Some(RETAILER));

        // Bus carries the same transitions, each settlement after its transition
        let events = tail.drain().unwrap();
        let transitions: Vec<&TransitionEvent> = events
            .iter()
            .filter_map(|e| match e {
                LedgerEvent::ItemTransitioned(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(transitions.len(), 8);
        assert!(transitions.windows(2).all(|w| w[0].sequence < w[1].sequence));

        let settled_after: Vec<EventKind> = events
            .windows(2)
            .filter_map(|w| match (&w[0], &w[1]) {
                (LedgerEvent::ItemTransitioned(t), LedgerEvent::PaymentSettled { .. }) => {
                    Some(t.kind)
                }
                _ => None,
            })
            .collect();
        assert_eq!(settled_after, vec![EventKind::Sold, EventKind::Purchased]);

        // Retailer was paid by the consumer, consumer got 1 unit back
        assert_eq!(h.funds.balance_of(&RETAILER), units(1));
        assert_eq!(h.funds.balance_of(&CONSUMER), units(9));
    }

    // =============================================================================
    // POLICY AND REGISTRY
    // =============================================================================

    #[tokio::test]
    async fn test_registered_policy_requires_consumer_role() {
        let h = Harness::with_config(
            LedgerConfig::new(ADMIN).with_consumer_policy(ConsumerPolicy::Registered),
        )
        .await;
        let upc = Upc(9);
        h.to_for_sale(upc, units(1)).await;
        h.ok(
            DISTRIBUTOR,
            LedgerCommand::BuyItem {
                upc,
                payment: units(1),
            },
        )
        .await;
        h.ok(DISTRIBUTOR, LedgerCommand::ShipItem { upc }).await;
        h.ok(RETAILER, LedgerCommand::ReceiveItem { upc }).await;

        let purchase = LedgerCommand::PurchaseItem {
            upc,
            payment: units(1),
        };
        let (kind, reason) = h.rejected(CONSUMER, purchase.clone()).await;
        assert_eq!(kind, ErrorKind::Unauthorized);
        assert_eq!(reason, "Only Consumer allowed");

        h.ok(ADMIN, LedgerCommand::AddConsumer { account: CONSUMER })
            .await;
        h.ok(CONSUMER, purchase).await;
        assert_eq!(h.state(upc).await, ItemState::Purchased);
    }

    #[tokio::test]
    async fn test_role_changes_reach_bus() {
        let h = Harness::new().await;
        let mut roles = h
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::RoleRegistry]));

        assert_eq!(
            h.ok(ADMIN, LedgerCommand::AddConsumer { account: CONSUMER })
                .await,
            CommandResult::RoleGranted(true)
        );
        // Idempotent grant publishes nothing
        assert_eq!(
            h.ok(ADMIN, LedgerCommand::AddConsumer { account: CONSUMER })
                .await,
            CommandResult::RoleGranted(false)
        );
        h.ok(CONSUMER, LedgerCommand::RenounceConsumer).await;

        let event = timeout(Duration::from_millis(100), roles.recv())
            .await
            .expect("timeout waiting for grant")
            .expect("should receive grant");
        assert_eq!(
            event,
            LedgerEvent::RoleGranted {
                role: RoleKind::Consumer,
                account: CONSUMER,
            }
        );
        let event = timeout(Duration::from_millis(100), roles.recv())
            .await
            .expect("timeout waiting for revoke")
            .expect("should receive revoke");
        assert_eq!(
            event,
            LedgerEvent::RoleRevoked {
                role: RoleKind::Consumer,
                account: CONSUMER,
            }
        );
        assert_eq!(roles.try_recv().unwrap(), None);

        assert_eq!(
            h.ok(FARMER, LedgerCommand::IsConsumer { account: CONSUMER })
                .await,
            CommandResult::Membership(false)
        );
    }

    #[tokio::test]
    async fn test_admin_handover() {
        let h = Harness::new().await;
        let new_admin = Identity::repeat(0xbe);

        assert_eq!(
            h.ok(ADMIN, LedgerCommand::TransferAdmin { account: new_admin })
                .await,
            CommandResult::AdminTransferred(ADMIN)
        );
        let (kind, reason) = h
            .rejected(ADMIN, LedgerCommand::AddRetailer { account: FARMER })
            .await;
        assert_eq!(kind, ErrorKind::Unauthorized);
        assert_eq!(reason, "Only Owner allowed");
        h.ok(new_admin, LedgerCommand::AddRetailer { account: FARMER })
            .await;
    }

    // =============================================================================
    // LIVE TAIL
    // =============================================================================

    #[tokio::test]
    async fn test_event_stream_per_item() {
        let h = Harness::new().await;
        let mut stream = h.bus.event_stream(EventFilter::for_upc(Upc(2)));

        h.harvest(Upc(1)).await;
        h.harvest(Upc(2)).await;
        h.ok(FARMER, LedgerCommand::ProcessItem { upc: Upc(1) }).await;
        h.ok(FARMER, LedgerCommand::ProcessItem { upc: Upc(2) }).await;

        let mut seen = Vec::new();
        for _ in 0..2 {
            let event = timeout(Duration::from_millis(200), stream.next())
                .await
                .expect("timeout waiting for stream")
                .expect("stream ended");
            seen.push(event);
        }
        assert!(seen.iter().all(|e| e.upc() == Some(Upc(2))));
        assert!(matches!(
            &seen[1],
            LedgerEvent::ItemTransitioned(t) if t.state == ItemState::Processed
        ));
    }

    #[tokio::test]
    async fn test_concurrent_items_keep_independent_histories() {
        let h = Arc::new(Harness::new().await);

        let mut tasks = Vec::new();
        for upc in 1..=8u64 {
            let h = Arc::clone(&h);
            tasks.push(tokio::spawn(async move {
                h.to_for_sale(Upc(upc), units(1)).await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        for upc in 1..=8u64 {
            let history = h.history(Upc(upc)).await;
            assert_eq!(history.len(), 4);
            assert!(history.windows(2).all(|w| w[0].sequence < w[1].sequence));
            assert_eq!(history[3].amount, Some(units(1)));
        }
    }

    #[tokio::test]
    async fn test_stats_track_rejections_by_kind() {
        let h = Harness::new().await;
        h.harvest(Upc(1)).await;
        h.rejected(DISTRIBUTOR, LedgerCommand::ProcessItem { upc: Upc(1) })
            .await;
        h.rejected(FARMER, LedgerCommand::PackItem { upc: Upc(1) })
            .await;
        h.rejected(FARMER, LedgerCommand::ProcessItem { upc: Upc(404) })
            .await;

        let stats = h.service.stats().await;
        // two role grants and one harvest
        assert_eq!(stats.commands_succeeded, 3);
        assert_eq!(stats.commands_rejected, 3);
        assert_eq!(stats.rejected(ErrorKind::Unauthorized), 1);
        assert_eq!(stats.rejected(ErrorKind::InvalidState), 1);
        assert_eq!(stats.rejected(ErrorKind::UnknownItem), 1);
    }
}
