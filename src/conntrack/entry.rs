use crate::error::CtError;

/// One direction of a tracked connection as the kernel reports it.
///
/// Addresses and ports stay opaque strings: they are only ever compared for
/// equality against the local address set and the port filters, never
/// interpreted numerically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnTuple {
    pub src_addr: String,
    pub dst_addr: String,
    pub src_port: String,
    pub dst_port: String,
    pub packets: u64,
    pub bytes: u64,
}

/// Kernel state marker distinguishing the two record layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// `[UNREPLIED]`: no return traffic observed yet. The marker sits
    /// between the original and reply tuples.
    Unreplied,
    /// `[ASSURED]`: the flow is confirmed bidirectional. The marker follows
    /// the reply tuple.
    Assured,
}

/// One decoded conntrack table line: the kernel's independently tracked
/// request-direction ("original") and return-direction ("reply") tuples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub state: EntryState,
    pub original: ConnTuple,
    pub reply: ConnTuple,
}

const UNREPLIED_MARKER: &str = "[UNREPLIED]";
const ASSURED_MARKER: &str = "[ASSURED]";

/// Collects the first and second occurrence of each recognized `key=` field.
///
/// Both record layouts list the original tuple before the reply tuple, so
/// occurrence order is all that is needed to tell them apart; positional
/// offsets would break as soon as a kernel version adds or drops a token.
#[derive(Default)]
struct FieldSlots<'a> {
    src: [Option<&'a str>; 2],
    dst: [Option<&'a str>; 2],
    sport: [Option<&'a str>; 2],
    dport: [Option<&'a str>; 2],
    packets: [Option<&'a str>; 2],
    bytes: [Option<&'a str>; 2],
}

impl<'a> FieldSlots<'a> {
    fn assign(&mut self, key: &str, value: &'a str) {
        let slot = match key {
            "src" => &mut self.src,
            "dst" => &mut self.dst,
            "sport" => &mut self.sport,
            "dport" => &mut self.dport,
            "packets" => &mut self.packets,
            "bytes" => &mut self.bytes,
            // mark=, secmark=, use=, ... carry no flow identity or traffic
            _ => return,
        };
        if slot[0].is_none() {
            slot[0] = Some(value);
        } else if slot[1].is_none() {
            slot[1] = Some(value);
        }
        // neither layout repeats a key a third time; ignore if one does
    }

    /// Assemble tuple `side` (0 = original, 1 = reply). All four address
    /// fields are required; counters default to zero when the kernel has
    /// accounting disabled.
    fn tuple(&self, side: usize) -> Result<ConnTuple, &'static str> {
        match (
            self.src[side],
            self.dst[side],
            self.sport[side],
            self.dport[side],
        ) {
            (Some(src_addr), Some(dst_addr), Some(src_port), Some(dst_port)) => Ok(ConnTuple {
                src_addr: src_addr.to_string(),
                dst_addr: dst_addr.to_string(),
                src_port: src_port.to_string(),
                dst_port: dst_port.to_string(),
                packets: parse_counter(self.packets[side])?,
                bytes: parse_counter(self.bytes[side])?,
            }),
            _ => Err("missing address fields"),
        }
    }
}

fn parse_counter(value: Option<&str>) -> Result<u64, &'static str> {
    match value {
        None => Ok(0),
        Some(v) => v.parse().map_err(|_| "bad counter value"),
    }
}

fn malformed(reason: &'static str, line: &str) -> CtError {
    CtError::MalformedLine {
        reason,
        line: line.to_string(),
    }
}

/// Decode one line of the conntrack table.
///
/// Returns `Ok(None)` for lines this tool does not account for: records of
/// other protocols (first token is not `tcp`) and TCP lines carrying
/// neither state marker. A line that claims to be a TCP record but lacks
/// the eight address/port fields, or carries a counter that does not parse,
/// is a `MalformedLine` error; callers are expected to log and skip it
/// rather than abort, since a live table can always hand us a torn line.
pub fn decode_entry(line: &str) -> Result<Option<RawEntry>, CtError> {
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        None => return Err(malformed("empty line", line)),
        Some("tcp") => {}
        Some(_) => return Ok(None),
    }

    let mut state = None;
    let mut fields = FieldSlots::default();
    for token in tokens {
        match token {
            UNREPLIED_MARKER => state = Some(EntryState::Unreplied),
            ASSURED_MARKER => state = Some(EntryState::Assured),
            _ => {
                if let Some((key, value)) = token.split_once('=') {
                    fields.assign(key, value);
                }
            }
        }
    }

    let Some(state) = state else {
        return Ok(None);
    };

    let original = fields.tuple(0).map_err(|reason| malformed(reason, line))?;
    let reply = fields.tuple(1).map_err(|reason| malformed(reason, line))?;
    Ok(Some(RawEntry {
        state,
        original,
        reply,
    }))
}
