//! QBE IR generation from the checked AST.
//!
//! The generator accumulates two textual sections -- `data` definitions
//! and function definitions -- plus a body buffer for the function
//! currently being emitted. Expression emission appends instructions to
//! the body and returns the temporary holding the result; statement
//! emission appends whole items.
//!
//! Symbol discipline: functions are `$name`; locals are `%name.<scope>`
//! (the scope id makes shadowed names unique); generated temporaries
//! are `%t0, %t1, ...` and labels `@L0, @L1, ...`.

pub mod expr;
pub mod pattern;
pub mod types;

use std::io::{self, Write};
use std::path::Path;

use fern_parser::ast::{NodeId, Pattern, PatternKind, Stmt, StmtKind};
use fern_typeck::Ty;
use rustc_hash::{FxHashMap, FxHashSet};

use self::types::{value_ty, QbeTy, Value};

/// A local variable binding in the current function.
#[derive(Debug, Clone)]
pub(crate) struct Local {
    pub(crate) qbe_name: String,
    pub(crate) ty: QbeTy,
}

/// One scope frame: its mangling id plus the bindings it introduced.
#[derive(Debug, Default)]
struct Frame {
    id: u32,
    locals: FxHashMap<String, Local>,
}

/// The QBE code generator.
///
/// Presumes a well-typed AST: the node-type table comes from a checker
/// run that reported no errors. Internal inconsistencies are program
/// bugs and panic.
pub struct Codegen<'t> {
    /// Inferred type of each AST node, keyed by parse id.
    types: &'t FxHashMap<NodeId, Ty>,

    /// `data` section text.
    pub(crate) data: String,
    /// Function section text.
    pub(crate) fns: String,
    /// Body of the function currently being emitted.
    pub(crate) body: String,
    /// Label of the basic block currently receiving instructions.
    pub(crate) cur_block: String,

    /// Counters: temporaries, labels, string literals, lifted lambdas,
    /// and scope ids.
    tmp: u32,
    lbl: u32,
    strs: u32,
    lambdas: u32,
    scope: u32,

    /// Scope stack of local bindings.
    scopes: Vec<Frame>,
    /// Names of user-defined top-level functions.
    pub(crate) fn_names: FxHashSet<String>,
}

impl<'t> Codegen<'t> {
    /// Create a generator over the checker's node-type table.
    pub fn new(types: &'t FxHashMap<NodeId, Ty>) -> Self {
        Codegen {
            types,
            data: String::new(),
            fns: String::new(),
            body: String::new(),
            cur_block: String::new(),
            tmp: 0,
            lbl: 0,
            strs: 0,
            lambdas: 0,
            scope: 0,
            scopes: Vec::new(),
            fn_names: FxHashSet::default(),
        }
    }

    // ── Program emission ───────────────────────────────────────────────

    /// Emit a complete program: every function definition, plus a
    /// synthesized `$main` holding the loose top-level statements when
    /// the program does not define `main` itself.
    pub fn program(&mut self, stmts: &[Stmt<'_>]) {
        for stmt in stmts {
            if let StmtKind::Fn { name, .. } = stmt.kind {
                self.fn_names.insert(name.to_string());
            }
        }

        let mut loose: Vec<&Stmt> = Vec::new();
        for stmt in stmts {
            match stmt.kind {
                StmtKind::Fn { .. } => self.emit_fn_stmt(stmt),
                StmtKind::TypeAlias { .. } | StmtKind::Import { .. } => {}
                StmtKind::Let { .. } | StmtKind::Expr(_) => loose.push(stmt),
            }
        }

        if !self.fn_names.contains("main") && !loose.is_empty() {
            self.emit_synthesized_main(&loose);
        }
    }

    /// Emit a single statement: function definitions go to the function
    /// section, other statements append to the current body.
    pub fn stmt(&mut self, stmt: &Stmt<'_>) {
        match stmt.kind {
            StmtKind::Fn { name, .. } => {
                self.fn_names.insert(name.to_string());
                self.emit_fn_stmt(stmt);
            }
            _ => self.emit_local_stmt(stmt),
        }
    }

    /// Emit an expression into the current body, returning the value.
    /// `None` means the expression has unit type.
    pub fn expr(&mut self, e: &fern_parser::ast::Expr<'_>) -> Option<Value> {
        if self.scopes.is_empty() {
            self.push_scope();
        }
        self.emit_expr(e)
    }

    // ── Output ─────────────────────────────────────────────────────────

    /// The accumulated IR: preamble, data section, then functions.
    pub fn output(&self) -> String {
        let mut out = String::from("# fern compiler output\n");
        if !self.data.is_empty() {
            out.push_str(&self.data);
        }
        if !self.fns.is_empty() {
            out.push_str(&self.fns);
        }
        if !self.body.is_empty() {
            // Instructions emitted outside any function (direct
            // expression emission, as used by tests and the REPL).
            out.push_str(&self.body);
        }
        out
    }

    /// Write the IR to a file.
    pub fn write(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.output())
    }

    /// Write the IR to a stream.
    pub fn emit(&self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(self.output().as_bytes())
    }

    // ── Function emission ──────────────────────────────────────────────

    fn emit_fn_stmt(&mut self, stmt: &Stmt<'_>) {
        let StmtKind::Fn {
            name, params, body, ..
        } = stmt.kind
        else {
            unreachable!("emit_fn_stmt requires a function statement");
        };
        let fn_ty = self.types.get(&stmt.id).cloned();
        self.emit_function(&format!("${name}"), params, body, fn_ty, name == "main");
    }

    fn emit_synthesized_main(&mut self, loose: &[&Stmt<'_>]) {
        self.push_scope();
        let saved_body = std::mem::take(&mut self.body);
        let saved_block = std::mem::take(&mut self.cur_block);
        self.place_label("@start".to_string());
        for stmt in loose {
            self.emit_local_stmt(stmt);
        }
        self.body.push_str("\tret 0\n");
        let fn_body = std::mem::replace(&mut self.body, saved_body);
        self.cur_block = saved_block;
        self.pop_scope();
        self.fns
            .push_str(&format!("export function w $main() {{\n{fn_body}}}\n"));
    }

    /// Emit a non-function statement into the current body.
    pub(crate) fn emit_local_stmt(&mut self, stmt: &Stmt<'_>) {
        if self.scopes.is_empty() {
            self.push_scope();
        }
        match stmt.kind {
            StmtKind::Let { pattern, value, .. } => {
                let v = self.emit_expr(value);
                if let Some(v) = v {
                    self.bind_pattern(pattern, &v);
                }
            }
            StmtKind::Expr(e) => {
                let _ = self.emit_expr(e);
            }
            StmtKind::TypeAlias { .. } | StmtKind::Import { .. } => {}
            StmtKind::Fn { .. } => unreachable!("function statements go to the function section"),
        }
    }

    /// Bind an irrefutable pattern to a value: binders copy, tuple
    /// patterns load their fields.
    pub(crate) fn bind_pattern(&mut self, pattern: &Pattern<'_>, value: &Value) {
        match pattern.kind {
            PatternKind::Wildcard => {}
            PatternKind::Binding(name) => {
                let scope_id = self.current_scope_id();
                let qbe_name = format!("%{name}.{scope_id}");
                self.body.push_str(&format!(
                    "\t{qbe_name} ={} copy {}\n",
                    value.ty, value.repr
                ));
                self.bind_local(name, qbe_name, value.ty);
            }
            PatternKind::Tuple(elems) => {
                for (i, elem) in elems.iter().enumerate() {
                    let elem_qbe = self
                        .types
                        .get(&elem.id)
                        .and_then(value_ty)
                        .unwrap_or(QbeTy::L);
                    let addr = self.new_tmp();
                    self.body.push_str(&format!(
                        "\t{addr} =l add {}, {}\n",
                        value.repr,
                        8 * i
                    ));
                    let field = self.new_tmp();
                    let load = if elem_qbe == QbeTy::D { "loadd" } else { "loadl" };
                    let loaded_ty = if elem_qbe == QbeTy::D { QbeTy::D } else { QbeTy::L };
                    self.body
                        .push_str(&format!("\t{field} ={loaded_ty} {load} {addr}\n"));
                    self.bind_pattern(elem, &Value::new(field, loaded_ty));
                }
            }
            // Refutable patterns in let position are not produced by a
            // checked program.
            _ => panic!("refutable pattern reached the emitter"),
        }
    }

    // ── Names, labels, scopes ──────────────────────────────────────────

    pub(crate) fn new_tmp(&mut self) -> String {
        let t = format!("%t{}", self.tmp);
        self.tmp += 1;
        t
    }

    pub(crate) fn new_label(&mut self) -> String {
        let l = format!("@L{}", self.lbl);
        self.lbl += 1;
        l
    }

    /// Start a new basic block.
    pub(crate) fn place_label(&mut self, label: String) {
        self.body.push_str(&format!("{label}\n"));
        self.cur_block = label;
    }

    pub(crate) fn push_scope(&mut self) -> u32 {
        let id = self.scope;
        self.scope += 1;
        self.scopes.push(Frame {
            id,
            locals: FxHashMap::default(),
        });
        id
    }

    pub(crate) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub(crate) fn current_scope_id(&self) -> u32 {
        self.scopes
            .last()
            .expect("a scope is always open during emission")
            .id
    }

    pub(crate) fn bind_local(&mut self, name: &str, qbe_name: String, ty: QbeTy) {
        self.scopes
            .last_mut()
            .expect("a scope is always open during emission")
            .locals
            .insert(name.to_string(), Local { qbe_name, ty });
    }

    pub(crate) fn lookup_local(&self, name: &str) -> Option<&Local> {
        self.scopes.iter().rev().find_map(|s| s.locals.get(name))
    }

    // ── Types ──────────────────────────────────────────────────────────

    pub(crate) fn ty_of(&self, id: NodeId) -> Option<&Ty> {
        self.types.get(&id)
    }

    // ── Coercion ───────────────────────────────────────────────────────

    /// Produce `value` as `target`. Widening `w` to `l` sign-extends;
    /// an `l` used as `w` is QBE's implicit truncating subtyping, so no
    /// instruction is needed.
    pub(crate) fn coerce(&mut self, value: &Value, target: QbeTy) -> Value {
        match (value.ty, target) {
            (QbeTy::W, QbeTy::L) => {
                let t = self.new_tmp();
                self.body
                    .push_str(&format!("\t{t} =l extsw {}\n", value.repr));
                Value::new(t, QbeTy::L)
            }
            (QbeTy::D, QbeTy::L) => {
                let t = self.new_tmp();
                self.body
                    .push_str(&format!("\t{t} =l cast {}\n", value.repr));
                Value::new(t, QbeTy::L)
            }
            (QbeTy::L, QbeTy::D) => {
                let t = self.new_tmp();
                self.body
                    .push_str(&format!("\t{t} =d cast {}\n", value.repr));
                Value::new(t, QbeTy::D)
            }
            _ => value.clone(),
        }
    }

    // ── String data ────────────────────────────────────────────────────

    /// Intern a string literal into the data section, returning its
    /// `$str.N` symbol. The bytes are NUL-terminated.
    pub(crate) fn string_data(&mut self, text: &str) -> String {
        let symbol = format!("$str.{}", self.strs);
        self.strs += 1;

        let mut segments = Vec::new();
        let mut run = String::new();
        for byte in text.bytes() {
            let printable = (0x20..0x7f).contains(&byte) && byte != b'"' && byte != b'\\';
            if printable {
                run.push(byte as char);
            } else {
                if !run.is_empty() {
                    segments.push(format!("b \"{run}\""));
                    run.clear();
                }
                segments.push(format!("b {byte}"));
            }
        }
        if !run.is_empty() {
            segments.push(format!("b \"{run}\""));
        }
        segments.push("b 0".to_string());

        self.data
            .push_str(&format!("data {symbol} = {{ {} }}\n", segments.join(", ")));
        symbol
    }

    /// Counter for lifted lambda symbols.
    pub(crate) fn new_lambda_symbol(&mut self) -> String {
        let s = format!("$lambda.{}", self.lambdas);
        self.lambdas += 1;
        s
    }
}
