use std::fmt;
use std::str::from_utf8;

/// Decoded RESP3 reply, as handed over by the protocol layer.
///
/// The cache never parses replies itself; it only stores them, clones them
/// out on a hit and charges their [`encoded_len`](Value::encoded_len) against
/// the shard budget.
#[derive(PartialEq, Clone)]
pub enum Value {
    /// A nil response from the server.
    Nil,
    /// An integer response.  Note that there are a few situations
    /// in which the server actually returns a string for an integer.
    Int(i64),
    /// An arbitrary binary data, usually represents a binary-safe string.
    BulkString(Vec<u8>),
    /// A response containing an array with more data. This is generally used by the server
    /// to express nested structures.
    Array(Vec<Value>),
    /// A simple string response, without line breaks and not binary safe.
    SimpleString(String),
    /// A status response which represents the string "OK".
    Okay,
    /// Unordered key,value list from the server.
    Map(Vec<(Value, Value)>),
    /// Unordered set value from the server.
    Set(Vec<Value>),
    /// A floating number response from the server.
    Double(f64),
    /// A boolean response from the server.
    Boolean(bool),
    /// First String is format and other is the string
    VerbatimString {
        /// Text's format type
        format: VerbatimFormat,
        /// Remaining string check format before using!
        text: String,
    },
    /// Very large number that out of the range of the signed 64 bit numbers,
    /// kept in its decimal textual form.
    BigNumber(String),
    /// Push data from the server.
    Push {
        /// Push Kind
        kind: PushKind,
        /// Remaining data from push message
        data: Vec<Value>,
    },
}

/// `VerbatimString`'s format types defined by RESP3
#[derive(PartialEq, Clone, Debug)]
pub enum VerbatimFormat {
    /// Unknown type to catch future formats.
    Unknown(String),
    /// `mkd` format
    Markdown,
    /// `txt` format
    Text,
}

impl fmt::Display for VerbatimFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerbatimFormat::Markdown => write!(f, "mkd"),
            VerbatimFormat::Unknown(val) => write!(f, "{val}"),
            VerbatimFormat::Text => write!(f, "txt"),
        }
    }
}

/// `Push` type's currently known kinds.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum PushKind {
    /// `Disconnection` is sent from the library when connection is closed.
    Disconnection,
    /// Other kind to catch future kinds.
    Other(String),
    /// `invalidate` is received when a key is changed/deleted.
    Invalidate,
    /// `message` is received when pubsub message published by another client.
    Message,
    /// `pmessage` is received when pubsub message published by another client and client subscribed to topic via pattern.
    PMessage,
    /// `smessage` is received when pubsub message published by another client and client subscribed to it with sharding.
    SMessage,
}

impl PushKind {
    /// Maps the kind string of a RESP3 push frame to its `PushKind`.
    pub fn from_kind_name(kind: &str) -> PushKind {
        match kind {
            "invalidate" => PushKind::Invalidate,
            "message" => PushKind::Message,
            "pmessage" => PushKind::PMessage,
            "smessage" => PushKind::SMessage,
            _ => PushKind::Other(kind.to_string()),
        }
    }
}

impl fmt::Display for PushKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushKind::Other(kind) => write!(f, "{kind}"),
            PushKind::Invalidate => write!(f, "invalidate"),
            PushKind::Message => write!(f, "message"),
            PushKind::PMessage => write!(f, "pmessage"),
            PushKind::SMessage => write!(f, "smessage"),
            PushKind::Disconnection => write!(f, "disconnection"),
        }
    }
}

impl Value {
    /// Number of bytes this reply occupies on the wire when RESP3 encoded.
    ///
    /// This is what an entry is charged for its value, so it is computed
    /// exactly rather than estimated from in-memory layout.
    pub fn encoded_len(&self) -> usize {
        match self {
            // $-1\r\n
            Value::Nil => 5,
            Value::Int(val) => 3 + decimal_len(*val),
            Value::BulkString(val) => blob_len(val.len()),
            Value::Array(values) | Value::Set(values) => aggregate_len(values.len(), values),
            Value::Okay => 5,
            Value::SimpleString(s) => 3 + s.len(),
            Value::Map(pairs) => {
                3 + decimal_len(pairs.len() as i64)
                    + pairs
                        .iter()
                        .map(|(k, v)| k.encoded_len() + v.encoded_len())
                        .sum::<usize>()
            }
            Value::Double(val) => 3 + val.to_string().len(),
            // #t\r\n
            Value::Boolean(_) => 4,
            // ={len}\r\n{fmt}:{text}\r\n
            Value::VerbatimString { text, .. } => blob_len(4 + text.len()),
            Value::BigNumber(val) => 3 + val.len(),
            Value::Push { kind, data } => {
                let kind_len = 3 + kind.to_string().len();
                aggregate_len(data.len() + 1, data) + kind_len
            }
        }
    }

    /// Returns the key bytes of a simple or bulk string reply.
    pub fn as_key_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::BulkString(bytes) => Some(bytes),
            Value::SimpleString(s) => Some(s.as_bytes()),
            Value::VerbatimString { text, .. } => Some(text.as_bytes()),
            _ => None,
        }
    }
}

fn decimal_len(val: i64) -> usize {
    let sign = usize::from(val < 0);
    let mut magnitude = val.unsigned_abs();
    let mut digits = 1;
    while magnitude >= 10 {
        magnitude /= 10;
        digits += 1;
    }
    sign + digits
}

fn blob_len(payload: usize) -> usize {
    // ${len}\r\n{payload}\r\n
    1 + decimal_len(payload as i64) + 2 + payload + 2
}

fn aggregate_len(count: usize, values: &[Value]) -> usize {
    3 + decimal_len(count as i64) + values.iter().map(Value::encoded_len).sum::<usize>()
}

impl fmt::Debug for Value {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Value::Nil => write!(fmt, "nil"),
            Value::Int(val) => write!(fmt, "int({val:?})"),
            Value::BulkString(ref val) => match from_utf8(val) {
                Ok(x) => write!(fmt, "bulk-string('{x:?}')"),
                Err(_) => write!(fmt, "binary-data({val:?})"),
            },
            Value::Array(ref values) => write!(fmt, "array({values:?})"),
            Value::Push { ref kind, ref data } => write!(fmt, "push({kind:?}, {data:?})"),
            Value::Okay => write!(fmt, "ok"),
            Value::SimpleString(ref s) => write!(fmt, "simple-string({s:?})"),
            Value::Map(ref values) => write!(fmt, "map({values:?})"),
            Value::Set(ref values) => write!(fmt, "set({values:?})"),
            Value::Double(ref d) => write!(fmt, "double({d:?})"),
            Value::Boolean(ref b) => write!(fmt, "boolean({b:?})"),
            Value::VerbatimString {
                ref format,
                ref text,
            } => {
                write!(fmt, "verbatim-string({format:?},{text:?})")
            }
            Value::BigNumber(ref m) => write!(fmt, "big-number({m:?})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_len_matches_wire_form() {
        assert_eq!(Value::Nil.encoded_len(), b"$-1\r\n".len());
        assert_eq!(Value::Okay.encoded_len(), b"+OK\r\n".len());
        assert_eq!(Value::Int(-42).encoded_len(), b":-42\r\n".len());
        assert_eq!(Value::Int(0).encoded_len(), b":0\r\n".len());
        assert_eq!(
            Value::SimpleString("0".into()).encoded_len(),
            b"+0\r\n".len()
        );
        assert_eq!(
            Value::BulkString(b"hello".to_vec()).encoded_len(),
            b"$5\r\nhello\r\n".len()
        );
        assert_eq!(Value::Boolean(true).encoded_len(), b"#t\r\n".len());
        assert_eq!(Value::Double(1.5).encoded_len(), b",1.5\r\n".len());
        assert_eq!(
            Value::VerbatimString {
                format: VerbatimFormat::Text,
                text: "hi".into(),
            }
            .encoded_len(),
            b"=6\r\ntxt:hi\r\n".len()
        );
    }

    #[test]
    fn test_encoded_len_of_aggregates() {
        let array = Value::Array(vec![Value::Int(1), Value::BulkString(b"ab".to_vec())]);
        assert_eq!(array.encoded_len(), b"*2\r\n:1\r\n$2\r\nab\r\n".len());

        let map = Value::Map(vec![(Value::SimpleString("k".into()), Value::Int(10))]);
        assert_eq!(map.encoded_len(), b"%1\r\n+k\r\n:10\r\n".len());

        let push = Value::Push {
            kind: PushKind::Invalidate,
            data: vec![Value::Nil],
        };
        assert_eq!(push.encoded_len(), b">2\r\n+invalidate\r\n$-1\r\n".len());
    }

    #[test]
    fn test_push_kind_names() {
        assert_eq!(PushKind::from_kind_name("invalidate"), PushKind::Invalidate);
        assert_eq!(
            PushKind::from_kind_name("tracking-redir-broken"),
            PushKind::Other("tracking-redir-broken".into())
        );
        assert_eq!(PushKind::Invalidate.to_string(), "invalidate");
    }

    #[test]
    fn test_key_bytes() {
        assert_eq!(
            Value::BulkString(b"key".to_vec()).as_key_bytes(),
            Some(b"key".as_slice())
        );
        assert_eq!(
            Value::SimpleString("key".into()).as_key_bytes(),
            Some(b"key".as_slice())
        );
        assert_eq!(Value::Int(1).as_key_bytes(), None);
    }
}
