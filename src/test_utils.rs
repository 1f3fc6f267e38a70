use std::{cell::RefCell, io, rc::Rc};

use crate::{ErrorKind, SchemyContext};

#[track_caller]
pub(crate) fn eval_assert_equal(ctx: &mut SchemyContext, a: &str, b: &str) {
    let av = ctx.eval_string(a).unwrap_or_else(|e| panic!("{}", e.format()));
    let bv = ctx.eval_string(b).unwrap_or_else(|e| panic!("{}", e.format()));
    assert!(av.equal(&bv), "{}(=> {}) != {}(=> {})", a, av, b, bv);
}

#[track_caller]
pub(crate) fn eval_assert(ctx: &mut SchemyContext, a: &str) {
    let av = ctx.eval_string(a).unwrap_or_else(|e| panic!("{}", e.format()));
    assert!(av.as_bool(), "{} is false", av);
}

#[track_caller]
pub(crate) fn eval_assert_not(ctx: &mut SchemyContext, a: &str) {
    let av = ctx.eval_string(a).unwrap_or_else(|e| panic!("{}", e.format()));
    assert!(!av.as_bool(), "{} is true", av);
}

#[track_caller]
pub(crate) fn eval_assert_error(ctx: &mut SchemyContext, a: &str, expected: &str) {
    match ctx.eval_string(a) {
        Ok(v) => panic!("Expected error but got {} for {}", v, a),
        Err(e) => assert_eq!(e.format(), expected),
    }
}

#[track_caller]
pub(crate) fn eval_assert_error_kind(ctx: &mut SchemyContext, a: &str, kind: ErrorKind) {
    match ctx.eval_string(a) {
        Ok(v) => panic!("Expected {} error but got {} for {}", kind, v, a),
        Err(e) => assert_eq!(e.kind(), kind, "{}", e.format()),
    }
}

/// An output sink whose contents can be inspected after handing a clone
/// of it to [`SchemyContext::set_output`].
#[derive(Clone, Default)]
pub(crate) struct SharedOutput {
    buffer: Rc<RefCell<Vec<u8>>>,
}

impl SharedOutput {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.borrow()).into_owned()
    }

    pub(crate) fn clear(&self) {
        self.buffer.borrow_mut().clear();
    }
}

impl io::Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
