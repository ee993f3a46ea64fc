//! Recursive directive-interpreting pack/unpack engine.
//!
//! # Cursors
//! Three cursors cooperate during a call.  The *wire cursor*
//! ([`WriteCursor`]/[`ReadCursor`]) tracks the position and remaining
//! capacity of the single wire buffer.  The *argument stream* is a
//! positional cursor over the caller's `&[Value]` slice; each directive
//! consumes exactly one value from it.  When the engine recurses into a
//! `[...]` group it consumes one `Value::Struct` and opens a *host cursor*
//! of the same type over that struct's fields, so every directive inside
//! the group sources from the struct instead of the caller.
//!
//! # Length-value fields
//! A `-` or `=` prefix puts a 1- or 2-byte length ahead of the field.  The
//! length is computed and range-checked against any declared capacity
//! before a single value byte moves.  An LV group of unknown size reserves
//! its prefix, packs the body, then backpatches the prefix with the
//! measured wire delta.  On the read side an LV group decodes inside a
//! sub-cursor bounded by the prefix, and the outer cursor then advances by
//! exactly the prefix length.
//!
//! # Failure
//! The first error unwinds every recursion frame unchanged.  Bytes already
//! committed to the wire stay in the buffer; a non-success return means
//! "discard the whole buffer", never "use the prefix that succeeded".

use crate::error::{PackError, Result};
use crate::format::{balanced, Directive, Kind, LvWidth, Scanner};
use crate::value::Value;
use crate::wire::{ReadCursor, WriteCursor};

// ── Value streams ────────────────────────────────────────────────────────────

/// Positional, single-consumption cursor over values.  Serves both as the
/// top-level argument stream and as the host cursor over a struct's fields.
struct Values<'a> {
    items: &'a [Value],
    pos: usize,
}

impl<'a> Values<'a> {
    fn new(items: &'a [Value]) -> Self {
        Self { items, pos: 0 }
    }

    fn next(&mut self) -> Result<&'a Value> {
        let v = self
            .items
            .get(self.pos)
            .ok_or_else(|| PackError::MissingValue(String::new()))?;
        self.pos += 1;
        Ok(v)
    }
}

fn expect_str(v: &Value) -> Result<&str> {
    v.as_str().ok_or_else(|| PackError::TypeMismatch(String::new()))
}

fn expect_list(v: &Value) -> Result<&[Value]> {
    v.as_list().ok_or_else(|| PackError::TypeMismatch(String::new()))
}

fn expect_struct(v: &Value) -> Result<&[Value]> {
    v.as_struct().ok_or_else(|| PackError::TypeMismatch(String::new()))
}

// ── Entry points ─────────────────────────────────────────────────────────────

/// Serialize `values` into `dest` as directed by `format`.
/// Returns the number of bytes written.
pub fn pack(dest: &mut [u8], format: &str, values: &[Value]) -> Result<usize> {
    if !balanced(format) {
        return Err(PackError::BracketMismatch);
    }
    let mut wire = WriteCursor::new(dest);
    let mut scan = Scanner::new(format);
    let mut args = Values::new(values);
    pack_frame(&mut wire, &mut scan, &mut args)?;
    Ok(wire.position())
}

/// Parse `src` as directed by `format`.
/// Returns the decoded value tree and the number of bytes read.
pub fn unpack(src: &[u8], format: &str) -> Result<(Vec<Value>, usize)> {
    if !balanced(format) {
        return Err(PackError::BracketMismatch);
    }
    let mut wire = ReadCursor::new(src);
    let mut scan = Scanner::new(format);
    let mut out = Vec::new();
    unpack_frame(&mut wire, &mut scan, &mut out)?;
    Ok((out, wire.position()))
}

/// Stream variant of [`pack`]: appends at the cursor's current position and
/// advances it on success.  On failure the cursor is left at its entry
/// position (already-written bytes are not cleared).
pub fn pack_into(wire: &mut WriteCursor<'_>, format: &str, values: &[Value]) -> Result<usize> {
    if !balanced(format) {
        return Err(PackError::BracketMismatch);
    }
    let start = wire.position();
    let mut scan = Scanner::new(format);
    let mut args = Values::new(values);
    match pack_frame(wire, &mut scan, &mut args) {
        Ok(()) => Ok(wire.position() - start),
        Err(e) => {
            wire.set_position(start);
            Err(e)
        }
    }
}

/// Stream variant of [`unpack`]: consumes from the cursor's current
/// position and advances it on success, leaving it unchanged on failure.
pub fn unpack_from(wire: &mut ReadCursor<'_>, format: &str) -> Result<(Vec<Value>, usize)> {
    if !balanced(format) {
        return Err(PackError::BracketMismatch);
    }
    let start = wire.position();
    let mut scan = Scanner::new(format);
    let mut out = Vec::new();
    match unpack_frame(wire, &mut scan, &mut out) {
        Ok(()) => Ok((out, wire.position() - start)),
        Err(e) => {
            wire.set_position(start);
            Err(e)
        }
    }
}

// ── Pack ─────────────────────────────────────────────────────────────────────

fn pack_frame(wire: &mut WriteCursor, scan: &mut Scanner, vals: &mut Values) -> Result<()> {
    while let Some(dir) = scan.next()? {
        if dir.kind == Kind::Close {
            return Ok(());
        }
        let frag = scan.mark();
        pack_one(wire, scan, vals, dir).map_err(|e| e.with_context(frag))?;
    }
    Ok(())
}

fn pack_one(
    wire: &mut WriteCursor,
    scan: &mut Scanner,
    vals: &mut Values,
    dir: Directive,
) -> Result<()> {
    match dir.kind {
        Kind::Open => pack_group(wire, scan, vals, dir),
        Kind::Str => pack_str(wire, vals, dir),
        Kind::Pad => pack_pad(wire, dir),
        // Close never reaches here: the frame loop returns on it
        _ => pack_scalar(wire, vals, dir),
    }
}

fn put_lv(wire: &mut WriteCursor, lv: LvWidth, len: usize) -> Result<()> {
    if len > lv.max_len() {
        return Err(PackError::Truncated(String::new()));
    }
    match lv {
        LvWidth::One => wire.put_u8(len as u8),
        LvWidth::Two => wire.put_u16(len as u16),
    }
}

fn put_scalar(wire: &mut WriteCursor, kind: Kind, v: &Value) -> Result<()> {
    match (kind, v) {
        (Kind::Char, Value::Char(x)) => wire.put_i8(*x),
        (Kind::Word, Value::Word(x)) => wire.put_i16(*x),
        (Kind::Dword, Value::Dword(x)) => wire.put_i32(*x),
        (Kind::Ddword, Value::Ddword(x)) => wire.put_i64(*x),
        (Kind::Float, Value::Float(x)) => wire.put_f32(*x),
        (Kind::Double, Value::Double(x)) => wire.put_f64(*x),
        _ => Err(PackError::TypeMismatch(String::new())),
    }
}

fn pack_scalar(wire: &mut WriteCursor, vals: &mut Values, dir: Directive) -> Result<()> {
    match (dir.lv, dir.count) {
        (None, None) => put_scalar(wire, dir.kind, vals.next()?),
        (Some(lv), cap) => {
            // LV array: one List value supplies the elements
            let list = expect_list(vals.next()?)?;
            if let Some(cap) = cap {
                if list.len() > cap {
                    return Err(PackError::Truncated(String::new()));
                }
            }
            put_lv(wire, lv, list.len())?;
            put_scalars(wire, dir.kind, list)
        }
        (None, Some(n)) => {
            // bare count: the list length is the wire length, exactly
            let list = expect_list(vals.next()?)?;
            if list.len() != n {
                return Err(PackError::TypeMismatch(String::new()));
            }
            put_scalars(wire, dir.kind, list)
        }
    }
}

fn put_scalars(wire: &mut WriteCursor, kind: Kind, list: &[Value]) -> Result<()> {
    for v in list {
        put_scalar(wire, kind, v)?;
    }
    Ok(())
}

fn pack_str(wire: &mut WriteCursor, vals: &mut Values, dir: Directive) -> Result<()> {
    let bytes = expect_str(vals.next()?)?.as_bytes();
    match dir.lv {
        Some(lv) => {
            // LV strings travel raw + length, no terminator on the wire.
            match dir.count {
                Some(0) if !bytes.is_empty() => return Err(PackError::Truncated(String::new())),
                Some(cap) if cap > 0 && bytes.len() > cap - 1 => {
                    return Err(PackError::Truncated(String::new()))
                }
                _ => {}
            }
            put_lv(wire, lv, bytes.len())?;
            wire.put_block(bytes)?;
            Ok(())
        }
        None => {
            // terminator-framed: an interior NUL cannot be represented
            if bytes.contains(&0) {
                return Err(PackError::TypeMismatch(String::new()));
            }
            match dir.count {
                None => {
                    wire.put_block(bytes)?;
                    wire.put_u8(0)
                }
                Some(0) => {
                    if bytes.is_empty() {
                        Ok(())
                    } else {
                        Err(PackError::Truncated(String::new()))
                    }
                }
                Some(cap) => {
                    // fixed wire width: bytes, terminator, zero fill
                    if bytes.len() > cap - 1 {
                        return Err(PackError::Truncated(String::new()));
                    }
                    wire.put_block(bytes)?;
                    wire.put_zeros(cap - bytes.len())
                }
            }
        }
    }
}

fn pack_pad(wire: &mut WriteCursor, dir: Directive) -> Result<()> {
    let n = dir.count.unwrap_or(1);
    if let Some(lv) = dir.lv {
        put_lv(wire, lv, n)?;
    }
    wire.put_zeros(n)
}

fn pack_group(
    wire: &mut WriteCursor,
    scan: &mut Scanner,
    vals: &mut Values,
    dir: Directive,
) -> Result<()> {
    let body = scan.clone(); // positioned just after '['
    match (dir.lv, dir.count) {
        (Some(lv), None) => {
            // total size unknown up front: reserve the prefix, pack the
            // body, backpatch with the measured wire delta
            let fields = expect_struct(vals.next()?)?;
            let at = wire.position();
            wire.put_zeros(lv.bytes())?;
            let start = wire.position();
            pack_body(wire, &body, fields)?;
            let len = wire.position() - start;
            if len > lv.max_len() {
                return Err(PackError::Truncated(String::new()));
            }
            match lv {
                LvWidth::One => wire.patch_u8(at, len as u8),
                LvWidth::Two => wire.patch_u16(at, len as u16),
            }
        }
        (None, None) => {
            let fields = expect_struct(vals.next()?)?;
            pack_body(wire, &body, fields)?;
        }
        (Some(lv), Some(cap)) => {
            // repeated group: one List of Structs supplies the elements
            let list = expect_list(vals.next()?)?;
            if list.len() > cap {
                return Err(PackError::Truncated(String::new()));
            }
            put_lv(wire, lv, list.len())?;
            pack_elements(wire, &body, list)?;
        }
        (None, Some(n)) => {
            let list = expect_list(vals.next()?)?;
            if list.len() != n {
                return Err(PackError::TypeMismatch(String::new()));
            }
            pack_elements(wire, &body, list)?;
        }
    }
    scan.skip_group()
}

fn pack_elements(wire: &mut WriteCursor, body: &Scanner, list: &[Value]) -> Result<()> {
    for elem in list {
        pack_body(wire, body, expect_struct(elem)?)?;
    }
    Ok(())
}

fn pack_body(wire: &mut WriteCursor, body: &Scanner, fields: &[Value]) -> Result<()> {
    let mut scan = body.clone();
    let mut host = Values::new(fields);
    pack_frame(wire, &mut scan, &mut host)
}

// ── Unpack ───────────────────────────────────────────────────────────────────

fn unpack_frame(wire: &mut ReadCursor, scan: &mut Scanner, out: &mut Vec<Value>) -> Result<()> {
    while let Some(dir) = scan.next()? {
        if dir.kind == Kind::Close {
            return Ok(());
        }
        let frag = scan.mark();
        unpack_one(wire, scan, out, dir).map_err(|e| e.with_context(frag))?;
    }
    Ok(())
}

fn unpack_one(
    wire: &mut ReadCursor,
    scan: &mut Scanner,
    out: &mut Vec<Value>,
    dir: Directive,
) -> Result<()> {
    match dir.kind {
        Kind::Open => unpack_group(wire, scan, out, dir),
        Kind::Str => unpack_str(wire, out, dir),
        Kind::Pad => unpack_pad(wire, dir),
        // Close never reaches here: the frame loop returns on it
        _ => unpack_scalar(wire, out, dir),
    }
}

fn get_lv(wire: &mut ReadCursor, lv: LvWidth) -> Result<usize> {
    match lv {
        LvWidth::One => wire.get_u8().map(usize::from),
        LvWidth::Two => wire.get_u16().map(usize::from),
    }
}

/// Read an LV prefix and range-check it against a declared capacity.
fn get_lv_checked(wire: &mut ReadCursor, lv: LvWidth, cap: Option<usize>) -> Result<usize> {
    let len = get_lv(wire, lv)?;
    if let Some(cap) = cap {
        if len > cap {
            return Err(PackError::Truncated(String::new()));
        }
    }
    Ok(len)
}

fn get_scalar(wire: &mut ReadCursor, kind: Kind) -> Result<Value> {
    match kind {
        Kind::Char => wire.get_i8().map(Value::Char),
        Kind::Word => wire.get_i16().map(Value::Word),
        Kind::Dword => wire.get_i32().map(Value::Dword),
        Kind::Ddword => wire.get_i64().map(Value::Ddword),
        Kind::Float => wire.get_f32().map(Value::Float),
        Kind::Double => wire.get_f64().map(Value::Double),
        _ => Err(PackError::TypeMismatch(String::new())),
    }
}

fn scalar_width(kind: Kind) -> usize {
    match kind {
        Kind::Word => 2,
        Kind::Dword | Kind::Float => 4,
        Kind::Ddword | Kind::Double => 8,
        _ => 1,
    }
}

fn unpack_scalar(wire: &mut ReadCursor, out: &mut Vec<Value>, dir: Directive) -> Result<()> {
    let n = match (dir.lv, dir.count) {
        (None, None) => {
            out.push(get_scalar(wire, dir.kind)?);
            return Ok(());
        }
        (Some(lv), cap) => get_lv_checked(wire, lv, cap)?,
        (None, Some(n)) => n,
    };
    // charge the whole array against the budget before decoding anything,
    // so a runaway count fails cleanly instead of driving the allocator
    let needed = n
        .checked_mul(scalar_width(dir.kind))
        .ok_or_else(|| PackError::OutOfBuffer(String::new()))?;
    if needed > wire.remaining() {
        return Err(PackError::OutOfBuffer(String::new()));
    }
    let mut items = Vec::with_capacity(n);
    for _ in 0..n {
        items.push(get_scalar(wire, dir.kind)?);
    }
    out.push(Value::List(items));
    Ok(())
}

fn utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| PackError::InvalidUtf8(String::new()))
}

fn unpack_str(wire: &mut ReadCursor, out: &mut Vec<Value>, dir: Directive) -> Result<()> {
    match dir.lv {
        Some(lv) => {
            let len = get_lv(wire, lv)?;
            match dir.count {
                Some(0) if len > 0 => return Err(PackError::Truncated(String::new())),
                Some(cap) if cap > 0 && len > cap - 1 => {
                    return Err(PackError::Truncated(String::new()))
                }
                _ => {}
            }
            let bytes = wire.take(len)?;
            out.push(Value::Str(utf8(bytes)?));
        }
        None => match dir.count {
            None => {
                let len = wire
                    .find_zero()
                    .ok_or_else(|| PackError::OutOfBuffer(String::new()))?;
                let bytes = wire.take(len)?;
                wire.skip(1)?; // terminator
                out.push(Value::Str(utf8(bytes)?));
            }
            Some(n) => {
                // fixed wire width: a terminator is required within the field
                let field = wire.take(n)?;
                let end = match field.iter().position(|&b| b == 0) {
                    Some(z) => z,
                    None if n == 0 => 0,
                    None => return Err(PackError::Truncated(String::new())),
                };
                out.push(Value::Str(utf8(&field[..end])?));
            }
        },
    }
    Ok(())
}

fn unpack_pad(wire: &mut ReadCursor, dir: Directive) -> Result<()> {
    let n = match dir.lv {
        Some(lv) => get_lv_checked(wire, lv, dir.count)?,
        None => dir.count.unwrap_or(1),
    };
    wire.skip(n)
}

fn unpack_group(
    wire: &mut ReadCursor,
    scan: &mut Scanner,
    out: &mut Vec<Value>,
    dir: Directive,
) -> Result<()> {
    let body = scan.clone();
    match (dir.lv, dir.count) {
        (Some(lv), None) => {
            // prefix declares the body budget; decode inside it, then skip
            // the whole region regardless of how much the body consumed
            let len = get_lv(wire, lv)?;
            let mut sub = wire.sub(len)?;
            out.push(Value::Struct(unpack_body(&mut sub, &body)?));
            wire.skip(len)?;
        }
        (None, None) => {
            out.push(Value::Struct(unpack_body(wire, &body)?));
        }
        (Some(lv), Some(cap)) => {
            let n = get_lv_checked(wire, lv, Some(cap))?;
            out.push(unpack_elements(wire, &body, n)?);
        }
        (None, Some(n)) => {
            out.push(unpack_elements(wire, &body, n)?);
        }
    }
    scan.skip_group()
}

fn unpack_elements(wire: &mut ReadCursor, body: &Scanner, n: usize) -> Result<Value> {
    // elements have no fixed width, so bound the reservation by the bytes
    // that could possibly remain and let the decode loop hit the wall
    let mut items = Vec::with_capacity(n.min(wire.remaining()));
    for _ in 0..n {
        items.push(Value::Struct(unpack_body(wire, body)?));
    }
    Ok(Value::List(items))
}

fn unpack_body(wire: &mut ReadCursor, body: &Scanner) -> Result<Vec<Value>> {
    let mut scan = body.clone();
    let mut fields = Vec::new();
    unpack_frame(wire, &mut scan, &mut fields)?;
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lv_group_backpatches_measured_length() {
        let mut buf = [0u8; 16];
        let tree = vec![Value::Struct(vec![Value::Dword(1), Value::Str("ab".into())])];
        let n = pack(&mut buf, "-[d s]", &tree).unwrap();
        // 1 prefix + 4 dword + 2 chars + terminator
        assert_eq!(n, 8);
        assert_eq!(buf[0], 7);
        assert_eq!(&buf[1..8], &[0, 0, 0, 1, b'a', b'b', 0]);
    }

    #[test]
    fn lv_group_decodes_inside_its_budget() {
        // prefix says 7 bytes although the buffer holds more
        let wire_bytes = [7u8, 0, 0, 0, 1, b'a', b'b', 0, 0xee];
        let (tree, read) = unpack(&wire_bytes, "-[d s]").unwrap();
        assert_eq!(read, 8);
        assert_eq!(
            tree,
            vec![Value::Struct(vec![Value::Dword(1), Value::Str("ab".into())])]
        );
    }

    #[test]
    fn lv_overflowing_its_prefix_is_truncated() {
        let tree = vec![Value::Struct(vec![Value::List(
            (0..300).map(Value::Dword).collect(),
        )])];
        // body is 1200 bytes, beyond a 1-byte prefix
        let mut buf = vec![0u8; 2048];
        assert_eq!(
            pack(&mut buf, "-[300d]", &tree).unwrap_err(),
            PackError::Truncated("-[300d]".to_string())
        );
        // a 2-byte prefix fits
        assert_eq!(pack(&mut buf, "=[300d]", &tree).unwrap(), 2 + 1200);
    }

    #[test]
    fn error_context_is_the_failing_fragment() {
        let mut buf = [0u8; 2];
        let err = pack(&mut buf, "w d", &[Value::Word(1), Value::Dword(2)]).unwrap_err();
        assert_eq!(err, PackError::OutOfBuffer("d".to_string()));
        assert_eq!(err.code(), -1);
    }

    #[test]
    fn close_at_top_level_stops_the_frame() {
        // balanced overall, but ']' first: nothing is packed (C behavior)
        let mut buf = [0u8; 8];
        assert_eq!(pack(&mut buf, "]d[", &[Value::Dword(1)]).unwrap(), 0);
    }

    #[test]
    fn trailing_values_are_ignored() {
        let mut buf = [0u8; 8];
        let n = pack(&mut buf, "w", &[Value::Word(1), Value::Word(2)]).unwrap();
        assert_eq!(n, 2);
    }
}
