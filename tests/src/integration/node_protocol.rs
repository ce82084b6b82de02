//! # Node Line Protocol
//!
//! Feeds the node newline-delimited envelopes and reads back its responses,
//! the way an operator script would drive the binary over stdin/stdout.

#[cfg(test)]
mod tests {
    use ledger_node::{NodeConfig, NodeRuntime};
    use serde_json::{json, Value};
    use supply_chain::prelude::*;
    use tokio::io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader};

    const ADMIN: Identity = Identity::repeat(0xad);
    const FARMER: Identity = Identity::repeat(0x01);
    const DISTRIBUTOR: Identity = Identity::repeat(0x02);
    const RETAILER: Identity = Identity::repeat(0x03);
    const CONSUMER: Identity = Identity::repeat(0x04);

    fn node() -> NodeRuntime {
        let vars = [
            ("SC_ADMIN", ADMIN.to_hex()),
            (
                "SC_GENESIS_BALANCES",
                format!("{}=10,{}=10", DISTRIBUTOR.to_hex(), CONSUMER.to_hex()),
            ),
        ];
        let config = NodeConfig::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap();
        NodeRuntime::new(config).unwrap()
    }

    fn line(caller: Identity, command: Value) -> String {
        json!({ "caller": caller.to_hex(), "command": command }).to_string()
    }

    fn script() -> Vec<String> {
        let one = serde_json::to_value(units(1)).unwrap();
        let two = serde_json::to_value(units(2)).unwrap();
        vec![
            line(ADMIN, json!({"op": "addDistributor", "account": DISTRIBUTOR.to_hex()})),
            line(ADMIN, json!({"op": "addRetailer", "account": RETAILER.to_hex()})),
            line(
                FARMER,
                json!({"op": "harvestItem", "upc": 1, "details": {
                    "farmName": "John Doe",
                    "farmInformation": "Yarray Valley",
                    "latitude": "-38.239770",
                    "longitude": "144.341490",
                    "productNotes": "Best beans for Espresso",
                }}),
            ),
            line(FARMER, json!({"op": "processItem", "upc": 1})),
            line(FARMER, json!({"op": "packItem", "upc": 1})),
            line(FARMER, json!({"op": "sellItem", "upc": 1, "price": one})),
            // Wrong caller, rejected
            line(RETAILER, json!({"op": "buyItem", "upc": 1, "payment": one})),
            line(DISTRIBUTOR, json!({"op": "buyItem", "upc": 1, "payment": two})),
            line(DISTRIBUTOR, json!({"op": "shipItem", "upc": 1})),
            line(RETAILER, json!({"op": "receiveItem", "upc": 1})),
            line(CONSUMER, json!({"op": "purchaseItem", "upc": 1, "payment": one})),
            line(CONSUMER, json!({"op": "fetchItemBufferOne", "upc": 1})),
            line(CONSUMER, json!({"op": "balanceOf", "account": FARMER.to_hex()})),
        ]
    }

    #[tokio::test]
    async fn test_scripted_chain_over_pipes() {
        let node = node();
        let tail = node.start();

        let (mut client_in, server_in) = duplex(64 * 1024);
        let (server_out, client_out) = duplex(64 * 1024);

        let input = script();
        let expected = input.len();
        let writer = tokio::spawn(async move {
            for l in input {
                client_in.write_all(l.as_bytes()).await.unwrap();
                client_in.write_all(b"\n").await.unwrap();
            }
            // Dropping the writer closes the node's input
        });

        let summary = node.serve(BufReader::new(server_in), server_out).await.unwrap();
        writer.await.unwrap();

        assert_eq!(summary.lines as usize, expected);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.malformed, 0);

        let mut responses = Vec::new();
        let mut lines = BufReader::new(client_out).lines();
        while let Some(l) = lines.next_line().await.unwrap() {
            responses.push(serde_json::from_str::<Value>(&l).unwrap());
        }
        assert_eq!(responses.len(), expected);

        let rejected = &responses[6]["outcome"];
        assert_eq!(rejected["status"], "rejected");
        assert_eq!(rejected["kind"], "Unauthorized");
        assert_eq!(rejected["reason"], "Only Distributor allowed");

        let buffer = &responses[11]["outcome"]["result"]["bufferOne"];
        assert_eq!(buffer["ownerID"], CONSUMER.to_hex());
        assert_eq!(buffer["originFarmerID"], FARMER.to_hex());

        let balance: Amount =
            serde_json::from_value(responses[12]["outcome"]["result"]["balance"].clone()).unwrap();
        assert_eq!(balance, units(1));
        assert_eq!(node.funds().balance_of(&RETAILER), units(1));

        node.shutdown();
        // 8 transitions, 2 settlements, 2 role grants
        assert_eq!(tail.await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_correlation_id_echoed() {
        let node = node();
        let input = format!(
            "{}\n",
            json!({
                "correlationId": "6f1c2f4e-8a55-4c3e-9f57-0d2a9b1c7e10",
                "caller": FARMER.to_hex(),
                "command": {"op": "fetchItem", "upc": 77},
            })
        );

        let mut output = Vec::new();
        node.serve(input.as_bytes(), &mut output).await.unwrap();

        let response: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(response["correlationId"], "6f1c2f4e-8a55-4c3e-9f57-0d2a9b1c7e10");
        assert_eq!(response["outcome"]["kind"], "UnknownItem");
    }
}
