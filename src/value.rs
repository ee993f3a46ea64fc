/// Host-side value tree consumed by `pack` and produced by `unpack`.
///
/// One directive consumes or produces exactly one `Value`: scalars map to
/// the scalar arms, arrays to `List`, `[...]` groups to `Struct`.  Repeated
/// groups are a `List` of `Struct`s.  Pad directives touch no values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Char(i8),
    Word(i16),
    Dword(i32),
    Ddword(i64),
    Float(f32),
    Double(f64),
    Str(String),
    List(Vec<Value>),
    Struct(Vec<Value>),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Char(_) => "char",
            Value::Word(_) => "word",
            Value::Dword(_) => "dword",
            Value::Ddword(_) => "ddword",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Struct(_) => "struct",
        }
    }

    pub fn as_i8(&self) -> Option<i8> {
        match self {
            Value::Char(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Value::Word(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Dword(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Ddword(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&[Value]> {
        match self {
            Value::Struct(fields) => Some(fields),
            _ => None,
        }
    }
}

// Unsigned sources are accepted bit-for-bit; the wire does not distinguish
// signedness.
impl From<i8> for Value {
    fn from(x: i8) -> Self { Value::Char(x) }
}
impl From<u8> for Value {
    fn from(x: u8) -> Self { Value::Char(x as i8) }
}
impl From<i16> for Value {
    fn from(x: i16) -> Self { Value::Word(x) }
}
impl From<u16> for Value {
    fn from(x: u16) -> Self { Value::Word(x as i16) }
}
impl From<i32> for Value {
    fn from(x: i32) -> Self { Value::Dword(x) }
}
impl From<u32> for Value {
    fn from(x: u32) -> Self { Value::Dword(x as i32) }
}
impl From<i64> for Value {
    fn from(x: i64) -> Self { Value::Ddword(x) }
}
impl From<u64> for Value {
    fn from(x: u64) -> Self { Value::Ddword(x as i64) }
}
impl From<f32> for Value {
    fn from(x: f32) -> Self { Value::Float(x) }
}
impl From<f64> for Value {
    fn from(x: f64) -> Self { Value::Double(x) }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Str(s.to_string()) }
}
impl From<String> for Value {
    fn from(s: String) -> Self { Value::Str(s) }
}
