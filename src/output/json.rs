use std::io::Write;

use crate::conntrack::flow::HostFlow;
use crate::error::CtError;

/// Write flows as a JSON list, in the order given.
///
/// Peer addresses stay numeric here: the JSON contract carries exactly
/// what the kernel reported, and consumers resolve names themselves.
pub fn write_json(rows: &[&HostFlow], writer: &mut impl Write) -> Result<(), CtError> {
    serde_json::to_writer_pretty(writer, rows)
        .map_err(|e| CtError::Serialization(std::io::Error::other(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conntrack::flow::FlowStat;

    fn flows() -> Vec<HostFlow> {
        vec![
            HostFlow::active(
                "10.0.100.1".into(),
                "3306".into(),
                FlowStat {
                    total_inbound_packets: 10,
                    total_inbound_bytes: 1000,
                    total_outbound_packets: 8,
                    total_outbound_bytes: 800,
                },
            ),
            HostFlow::passive(
                "80".into(),
                "10.0.200.1".into(),
                FlowStat {
                    total_inbound_packets: 100,
                    total_inbound_bytes: 90000,
                    total_outbound_packets: 90,
                    total_outbound_bytes: 50000,
                },
            ),
        ]
    }

    #[test]
    fn empty_input_is_an_empty_list() {
        let mut buf = Vec::new();
        write_json(&[], &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert!(parsed.as_array().unwrap().is_empty());
    }

    #[test]
    fn top_level_is_a_list_of_flow_objects() {
        let flows = flows();
        let rows: Vec<&HostFlow> = flows.iter().collect();
        let mut buf = Vec::new();
        write_json(&rows, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        let list = parsed.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["direction"].as_str().unwrap(), "active");
        assert_eq!(list[1]["direction"].as_str().unwrap(), "passive");
    }

    #[test]
    fn endpoints_keep_addr_and_port_split() {
        let flows = flows();
        let rows: Vec<&HostFlow> = flows.iter().collect();
        let mut buf = Vec::new();
        write_json(&rows, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["local"]["addr"].as_str().unwrap(), "localhost");
        assert_eq!(parsed[0]["local"]["port"].as_str().unwrap(), "many");
        assert_eq!(parsed[0]["peer"]["addr"].as_str().unwrap(), "10.0.100.1");
        assert_eq!(parsed[0]["peer"]["port"].as_str().unwrap(), "3306");
        assert_eq!(parsed[1]["local"]["port"].as_str().unwrap(), "80");
        assert_eq!(parsed[1]["peer"]["port"].as_str().unwrap(), "many");
    }

    #[test]
    fn stat_fields_are_snake_case_numbers() {
        let flows = flows();
        let rows: Vec<&HostFlow> = flows.iter().collect();
        let mut buf = Vec::new();
        write_json(&rows, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();

        assert!(output.contains("\"total_inbound_packets\""));
        assert!(output.contains("\"total_inbound_bytes\""));
        assert!(output.contains("\"total_outbound_packets\""));
        assert!(output.contains("\"total_outbound_bytes\""));

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["stat"]["total_inbound_packets"].as_u64(), Some(10));
        assert_eq!(parsed[1]["stat"]["total_inbound_bytes"].as_u64(), Some(90000));
    }

    #[test]
    fn large_counters_survive_serialization() {
        let flow = HostFlow::active(
            "10.0.0.2".into(),
            "443".into(),
            FlowStat {
                total_inbound_packets: u64::MAX,
                total_inbound_bytes: u64::MAX,
                total_outbound_packets: 0,
                total_outbound_bytes: 0,
            },
        );
        let rows = vec![&flow];
        let mut buf = Vec::new();
        write_json(&rows, &mut buf).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(
            parsed[0]["stat"]["total_inbound_packets"].as_u64(),
            Some(u64::MAX)
        );
    }
}
