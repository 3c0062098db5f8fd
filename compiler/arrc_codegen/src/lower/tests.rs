use arrc_ir::{
    AstArena, BinaryOp, Callee, FunctionDef, FunctionScope, Literal, Name, Node, NodeId, NodeKind,
    Param, StringInterner, TypeId, TypePool, UnaryOp,
};
use pretty_assertions::assert_eq;

use super::FunctionLowerer;
use crate::{CodegenError, CodegenOptions, CodegenOutput, CompilationSession};

struct Fixture {
    interner: StringInterner,
    types: TypePool,
    ast: AstArena,
    scope: FunctionScope,
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            interner: StringInterner::new(),
            types: TypePool::new(),
            ast: AstArena::new(),
            scope: FunctionScope::new(),
        }
    }

    fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    fn local(&mut self, s: &str, ty: TypeId) -> NodeId {
        let name = self.name(s);
        self.scope.local(name, ty);
        self.ast.push(NodeKind::Symbol(name), ty)
    }

    fn param(&mut self, s: &str, ty: TypeId) -> (Param, NodeId) {
        let name = self.name(s);
        self.scope.param(name, ty);
        (Param { name, ty }, self.ast.push(NodeKind::Symbol(name), ty))
    }

    fn int(&mut self, v: i64) -> NodeId {
        self.ast.push(NodeKind::Literal(Literal::Int(v)), TypeId::INT64)
    }

    fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId, ty: TypeId) -> NodeId {
        self.ast.push(NodeKind::Binary { op, left, right }, ty)
    }

    fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        self.ast
            .push(NodeKind::Assign { target, value }, TypeId::NOTHING)
    }

    fn ret(&mut self, value: Option<NodeId>) -> NodeId {
        self.ast.push(NodeKind::Return { value }, TypeId::NOTHING)
    }

    fn call(&mut self, module: &str, name: &str, args: &[NodeId], ty: TypeId) -> NodeId {
        let callee = Callee::Function {
            module: Some(self.name(module)),
            name: self.name(name),
        };
        let args = self.ast.alloc_list(args);
        self.ast.push(NodeKind::Call { callee, args }, ty)
    }

    fn body(&mut self, stmts: &[NodeId]) -> NodeId {
        let stmts = self.ast.alloc_list(stmts);
        self.ast.push(NodeKind::Body { stmts }, TypeId::NOTHING)
    }

    fn func(&self, name: &str, params: Vec<Param>, ret: TypeId, body: NodeId) -> FunctionDef {
        FunctionDef {
            name: self.name(name),
            module: self.name("M"),
            params,
            return_type: ret,
            body,
            is_root: false,
        }
    }

    fn generate(
        &self,
        def: &FunctionDef,
        options: CodegenOptions,
    ) -> Result<CodegenOutput, CodegenError> {
        let mut session = CompilationSession::new(&self.interner, &self.types, &self.ast, options);
        session.lower_function(def, &self.scope)?;
        session.finish()
    }
}

fn function_text(code: &str, signature: &str) -> String {
    let start = code
        .find(&format!("{signature}\n{{"))
        .unwrap_or_else(|| panic!("no definition for `{signature}` in:\n{code}"));
    let end = code[start..].find("}\n\n").unwrap() + start;
    code[start..end + 2].to_owned()
}

fn position(code: &str, needle: &str) -> usize {
    code.find(needle)
        .unwrap_or_else(|| panic!("`{needle}` not found in:\n{code}"))
}

#[test]
fn test_scalar_assignment_round_trip() {
    let mut fx = Fixture::new();
    let (x_param, x) = fx.param("x", TypeId::INT64);
    let y = fx.local("y", TypeId::INT64);
    let one = fx.int(1);
    let sum = fx.binary(BinaryOp::Add, x, one, TypeId::INT64);
    let assign = fx.assign(y, sum);
    let ret = fx.ret(Some(y));
    let body = fx.body(&[assign, ret]);
    let def = fx.func("f", vec![x_param], TypeId::INT64, body);

    let out = fx.generate(&def, CodegenOptions::default()).unwrap();
    assert_eq!(
        function_text(&out.code, "int64_t M_f(int64_t x)"),
        "int64_t M_f(int64_t x)\n{\nint64_t y;\n\n// Initializing arrays\n\
         y = (x) + (1);\nreturn y;\n}\n"
    );
    assert!(out.advisories.is_empty());
}

#[test]
fn test_operands_are_evaluated_left_to_right() {
    let mut fx = Fixture::new();
    let (a_param, a) = fx.param("a", TypeId::INT64);
    let (b_param, b) = fx.param("b", TypeId::INT64);
    let z = fx.local("z", TypeId::INT64);
    let fa = fx.call("M", "f", &[a], TypeId::INT64);
    let gb = fx.call("M", "g", &[b], TypeId::INT64);
    let sum = fx.binary(BinaryOp::Add, fa, gb, TypeId::INT64);
    let assign = fx.assign(z, sum);
    let body = fx.body(&[assign]);
    let def = fx.func("h", vec![a_param, b_param], TypeId::NOTHING, body);

    let options = CodegenOptions::default().with_min_temps(false);
    let code = fx.generate(&def, options).unwrap().code;
    let f_call = position(&code, "= M_f(a);");
    let g_call = position(&code, "= M_g(b);");
    let add = position(&code, "= (__t");
    let store = position(&code, "z = __t");
    assert!(f_call < g_call && g_call < add && add < store, "{code}");
}

#[test]
fn test_min_temps_inlines_nested_calls() {
    let mut fx = Fixture::new();
    let (a_param, a) = fx.param("a", TypeId::INT64);
    let z = fx.local("z", TypeId::INT64);
    let fa = fx.call("M", "f", &[a], TypeId::INT64);
    let neg = fx
        .ast
        .push(NodeKind::Unary { op: UnaryOp::Neg, operand: fa }, TypeId::INT64);
    let assign = fx.assign(z, neg);
    let body = fx.body(&[assign]);
    let def = fx.func("h", vec![a_param], TypeId::NOTHING, body);

    let code = fx.generate(&def, CodegenOptions::default()).unwrap().code;
    assert!(code.contains("z = -(M_f(a));\n"), "{code}");
    assert!(!code.contains("__t"), "{code}");
}

#[test]
fn test_hoisted_operand_is_emitted_before_its_statement() {
    let mut fx = Fixture::new();
    let (a_param, a) = fx.param("a", TypeId::INT64);
    let w = fx.local("w", TypeId::INT64);
    let y = fx.local("y", TypeId::INT64);
    let seven = fx.int(7);
    let first = fx.assign(w, seven);

    // `M_inv(a)` does not depend on the loop nest of the second statement.
    let callee = Callee::Function {
        module: Some(fx.name("M")),
        name: fx.name("inv"),
    };
    let args = fx.ast.alloc_list(&[a]);
    let inv = fx
        .ast
        .alloc(Node::new(NodeKind::Call { callee, args }, TypeId::INT64));
    let sum = fx.ast.alloc(
        Node::new(
            NodeKind::Binary {
                op: BinaryOp::Mul,
                left: inv,
                right: y,
            },
            TypeId::INT64,
        )
        .with_fusion_depth(1),
    );
    let second = fx.ast.alloc(
        Node::new(
            NodeKind::Assign {
                target: y,
                value: sum,
            },
            TypeId::NOTHING,
        )
        .with_fusion_depth(1),
    );
    let body = fx.body(&[first, second]);
    let def = fx.func("h", vec![a_param], TypeId::NOTHING, body);

    let options = CodegenOptions::default().with_min_temps(false);
    let code = fx.generate(&def, options).unwrap().code;
    assert!(
        position(&code, "= M_inv(a);") < position(&code, "w = __t"),
        "{code}"
    );
}

#[test]
fn test_temporary_assignment_becomes_rename() {
    let mut fx = Fixture::new();
    let (x_param, x) = fx.param("x", TypeId::INT64);
    let ssa = fx.ast.push(NodeKind::SsaValue(0), TypeId::INT64);
    let ssa_use = fx.ast.push(NodeKind::SsaValue(0), TypeId::INT64);
    let one = fx.int(1);
    let sum = fx.binary(BinaryOp::Add, x, one, TypeId::INT64);
    let def_ssa = fx.assign(ssa, sum);
    let ret = fx.ret(Some(ssa_use));
    let body = fx.body(&[def_ssa, ret]);
    let def = fx.func("f", vec![x_param], TypeId::INT64, body);

    let code = fx.generate(&def, CodegenOptions::default()).unwrap().code;
    assert!(code.contains("return (x) + (1);\n"), "{code}");
    assert!(!code.contains("int64_t __t"), "{code}");
}

#[test]
fn test_temporaries_are_declared_without_min_temps() {
    let mut fx = Fixture::new();
    let (x_param, x) = fx.param("x", TypeId::INT64);
    let ssa = fx.ast.push(NodeKind::SsaValue(0), TypeId::INT64);
    let ssa_use = fx.ast.push(NodeKind::SsaValue(0), TypeId::INT64);
    let def_ssa = fx.assign(ssa, x);
    let ret = fx.ret(Some(ssa_use));
    let body = fx.body(&[def_ssa, ret]);
    let def = fx.func("f", vec![x_param], TypeId::INT64, body);

    let options = CodegenOptions::default().with_min_temps(false);
    let code = fx.generate(&def, options).unwrap().code;
    assert!(code.contains("int64_t __t0;\n"), "{code}");
    assert!(code.contains("__t0 = x;\nreturn __t0;\n"), "{code}");
}

#[test]
fn test_alias_chain_longer_than_limit_is_rejected() {
    let mut fx = Fixture::new();
    let (x_param, x) = fx.param("x", TypeId::INT64);
    let s1 = fx.ast.push(NodeKind::SsaValue(1), TypeId::INT64);
    let s2 = fx.ast.push(NodeKind::SsaValue(2), TypeId::INT64);
    let s2_def = fx.ast.push(NodeKind::SsaValue(2), TypeId::INT64);
    let s1_use = fx.ast.push(NodeKind::SsaValue(1), TypeId::INT64);
    let first = fx.assign(s1, s2);
    let second = fx.assign(s2_def, x);
    let ret = fx.ret(Some(s1_use));
    let body = fx.body(&[first, second, ret]);
    let def = fx.func("f", vec![x_param], TypeId::INT64, body);

    let options = CodegenOptions::default().with_max_alias_chain(1);
    let err = fx.generate(&def, options).unwrap_err();
    assert!(
        matches!(err, CodegenError::InconsistentAlias { node, .. } if node == s1),
        "{err:?}"
    );
}

#[test]
fn test_unknown_node_is_fatal() {
    let mut fx = Fixture::new();
    let head = fx.name("foreigncall");
    let other = fx.ast.push(NodeKind::Other { head }, TypeId::NOTHING);
    let body = fx.body(&[other]);
    let def = fx.func("f", vec![], TypeId::NOTHING, body);

    let err = fx.generate(&def, CodegenOptions::default()).unwrap_err();
    assert_eq!(
        err,
        CodegenError::UnsupportedNode {
            kind: "foreigncall".to_owned(),
            node: other,
        }
    );
}

#[test]
fn test_unresolved_symbol_is_fatal() {
    let mut fx = Fixture::new();
    let ghost = fx.name("ghost");
    let sym = fx.ast.push(NodeKind::Symbol(ghost), TypeId::INT64);
    let ret = fx.ret(Some(sym));
    let body = fx.body(&[ret]);
    let def = fx.func("f", vec![], TypeId::INT64, body);

    let err = fx.generate(&def, CodegenOptions::default()).unwrap_err();
    assert!(matches!(err, CodegenError::UnresolvedSymbol { ref name, .. } if name == "ghost"));
}

#[test]
fn test_unknown_module_falls_back_with_advisory() {
    let mut fx = Fixture::new();
    let (x_param, x) = fx.param("x", TypeId::FLOAT64);
    let callee = Callee::Function {
        module: None,
        name: fx.name("sin"),
    };
    let args = fx.ast.alloc_list(&[x]);
    let call = fx
        .ast
        .push(NodeKind::Call { callee, args }, TypeId::FLOAT64);
    let ret = fx.ret(Some(call));
    let body = fx.body(&[ret]);
    let def = fx.func("f", vec![x_param], TypeId::FLOAT64, body);

    let out = fx.generate(&def, CodegenOptions::default()).unwrap();
    assert!(out.code.contains("return Base_sin(x);\n"), "{}", out.code);
    assert_eq!(out.advisories.len(), 1);
    assert_eq!(out.advisories[0].node, Some(call));
}

#[test]
fn test_foreign_and_void_calls_are_statements() {
    let mut fx = Fixture::new();
    let (x_param, x) = fx.param("x", TypeId::INT64);
    let puts = Callee::Foreign {
        name: fx.name("log_value"),
    };
    let args = fx.ast.alloc_list(&[x]);
    let foreign = fx
        .ast
        .push(NodeKind::Call { callee: puts, args }, TypeId::NOTHING);
    let side = fx.call("M", "touch", &[x], TypeId::INT64);
    let body = fx.body(&[foreign, side]);
    let def = fx.func("f", vec![x_param], TypeId::NOTHING, body);

    let code = fx.generate(&def, CodegenOptions::default()).unwrap().code;
    assert!(code.contains("log_value(x);\nM_touch(x);\n"), "{code}");
}

#[test]
fn test_self_recursive_call_uses_own_name() {
    let mut fx = Fixture::new();
    let (n_param, n) = fx.param("n", TypeId::INT64);
    let args = fx.ast.alloc_list(&[n]);
    let call = fx.ast.push(
        NodeKind::Call {
            callee: Callee::SelfRecursive,
            args,
        },
        TypeId::INT64,
    );
    let ret = fx.ret(Some(call));
    let body = fx.body(&[ret]);
    let def = fx.func("fact", vec![n_param], TypeId::INT64, body);

    let code = fx.generate(&def, CodegenOptions::default()).unwrap().code;
    assert!(code.contains("return M_fact(n);\n"), "{code}");
}

#[test]
fn test_literal_rendering() {
    let interner = StringInterner::new();
    let quoted = interner.intern("say \"hi\"\n");
    let cases = [
        (Literal::Int(-3), "-3"),
        (Literal::UInt(7), "7"),
        (Literal::Bool(true), "true"),
        (Literal::float64(0.5), "0.500000000000000"),
        (Literal::float32(1.5), "1.500000"),
        (Literal::float64(f64::INFINITY), "INFINITY"),
        (Literal::Pointer(0xbeef), "0x000000000000beef"),
        (Literal::Str(quoted), "\"say \\\"hi\\\"\\n\""),
        (Literal::Nothing, ""),
    ];
    for (lit, expected) in cases {
        assert_eq!(
            super::render_literal(&lit, &interner).as_deref(),
            Some(expected)
        );
    }
    let boxed = Literal::Boxed(interner.intern("h"));
    assert_eq!(super::render_literal(&boxed, &interner), None);
}

#[test]
fn test_boxed_literal_goes_through_temporary() {
    let mut fx = Fixture::new();
    let slot = fx.name("host_obj");
    let lit = fx
        .ast
        .push(NodeKind::Literal(Literal::Boxed(slot)), TypeId::INT64);
    let ret = fx.ret(Some(lit));
    let body = fx.body(&[ret]);
    let def = fx.func("f", vec![], TypeId::INT64, body);

    let out = fx.generate(&def, CodegenOptions::default()).unwrap();
    assert!(out.code.contains("__t0 = host_obj;\nreturn __t0;\n"), "{}", out.code);
    assert_eq!(out.advisories.len(), 1);
}

#[test]
fn test_control_flow_statements() {
    let mut fx = Fixture::new();
    let (c_param, c) = fx.param("c", TypeId::BOOL);
    let file = fx.name("kernel.jl");
    let line = fx.ast.push(
        NodeKind::LineNumber {
            line: 12,
            file: Some(file),
        },
        TypeId::NOTHING,
    );
    let branch = fx
        .ast
        .push(NodeKind::GotoIfNot { cond: c, label: 3 }, TypeId::NOTHING);
    let throw = fx.ast.push(NodeKind::Throw, TypeId::NOTHING);
    let label = fx.ast.push(NodeKind::Label(3), TypeId::NOTHING);
    let jump = fx.ast.push(NodeKind::Goto(3), TypeId::NOTHING);
    let body = fx.body(&[line, branch, throw, label, jump]);
    let def = fx.func("f", vec![c_param], TypeId::NOTHING, body);

    let code = fx.generate(&def, CodegenOptions::default()).unwrap().code;
    assert!(
        code.contains(
            "\n# 12 \"kernel.jl\"\nif (!(c)) goto label3;\nassert(false);\n\
             label3:\ngoto label3;\n"
        ),
        "{code}"
    );

    let quiet = fx
        .generate(&def, CodegenOptions::default().with_line_directives(false))
        .unwrap()
        .code;
    assert!(!quiet.contains("# 12"), "{quiet}");
}

#[test]
fn test_array_access_with_and_without_bounds_checks() {
    let mut fx = Fixture::new();
    let arr = fx.types.array(TypeId::FLOAT64, 1);
    let (a_param, a) = fx.param("a", arr);
    let (i_param, i) = fx.param("i", TypeId::INT64);
    let v = fx.local("v", TypeId::FLOAT64);
    let indices = fx.ast.alloc_list(&[i]);
    let read = fx.ast.push(
        NodeKind::ArrayRef {
            array: a,
            indices,
            inbounds: false,
        },
        TypeId::FLOAT64,
    );
    let load = fx.assign(v, read);
    let set_indices = fx.ast.alloc_list(&[i]);
    let write = fx.ast.push(
        NodeKind::ArraySet {
            array: a,
            value: v,
            indices: set_indices,
            inbounds: true,
        },
        TypeId::NOTHING,
    );
    let body = fx.body(&[load, write]);
    let def = fx.func("f", vec![a_param, i_param], TypeId::NOTHING, body);

    let code = fx.generate(&def, CodegenOptions::default()).unwrap().code;
    assert!(code.contains("void M_f(double_array a, int64_t i)"), "{code}");
    assert!(
        code.contains("ARRAYBOUNDSCHECK(a, i);\n__t0 = ARRAYELEM(a, i);\nv = __t0;\n"),
        "{code}"
    );
    assert!(code.contains("ARRAYELEM(a, i) = v;\n"), "{code}");
    assert_eq!(code.matches("ARRAYBOUNDSCHECK").count(), 1);

    let unchecked = fx
        .generate(&def, CodegenOptions::default().with_bounds_check(false))
        .unwrap()
        .code;
    assert!(unchecked.contains("v = ARRAYELEM(a, i);\n"), "{unchecked}");
    assert!(!unchecked.contains("ARRAYBOUNDSCHECK"), "{unchecked}");
}

#[test]
fn test_array_extents_and_data() {
    let mut fx = Fixture::new();
    let arr = fx.types.array(TypeId::INT32, 2);
    let ptr = fx.types.pointer(TypeId::INT32);
    let (a_param, a) = fx.param("a", arr);
    let n = fx.local("n", TypeId::INT64);
    let len = fx.local("len", TypeId::INT64);
    let p = fx.local("p", ptr);
    let size = fx
        .ast
        .push(NodeKind::ArraySize { array: a, dim: 2 }, TypeId::INT64);
    let count = fx.ast.push(NodeKind::ArrayLen { array: a }, TypeId::INT64);
    let data = fx.ast.push(NodeKind::ArrayPtr { array: a }, ptr);
    let s1 = fx.assign(n, size);
    let s2 = fx.assign(len, count);
    let s3 = fx.assign(p, data);
    let body = fx.body(&[s1, s2, s3]);
    let def = fx.func("f", vec![a_param], TypeId::NOTHING, body);

    let code = fx.generate(&def, CodegenOptions::default()).unwrap().code;
    assert!(code.contains("n = ARRAYSIZE(a, 2);\n"), "{code}");
    assert!(code.contains("len = ARRAYLEN(a);\n"), "{code}");
    assert!(code.contains("p = (a).data;\n"), "{code}");
    assert!(code.contains("int32_t* p;\n"), "{code}");
}

#[test]
fn test_inline_return_value_is_read_before_frees() {
    let mut fx = Fixture::new();
    let arr = fx.types.array(TypeId::FLOAT64, 1);
    let t = fx.local("t", arr);
    let four = fx.int(4);
    let dims = fx.ast.alloc_list(&[four]);
    let alloc = fx.ast.push(NodeKind::ArrayAlloc { dims }, arr);
    let s1 = fx.assign(t, alloc);
    let t_name = fx.name("t");
    let t_again = fx.ast.push(NodeKind::Symbol(t_name), arr);
    let len = fx
        .ast
        .push(NodeKind::ArrayLen { array: t_again }, TypeId::INT64);
    let s2 = fx.ret(Some(len));
    let body = fx.body(&[s1, s2]);
    let def = fx.func("f", vec![], TypeId::INT64, body);

    let code = fx.generate(&def, CodegenOptions::default()).unwrap().code;
    assert!(code.contains("int64_t __t1;\n"), "{code}");
    assert!(
        code.contains(
            "__t0 = new_double_array_1d(NULL, 4);\nt = __t0;\n\
             __t1 = ARRAYLEN(t);\nFREEARRAY(__t0);\nreturn __t1;\n"
        ),
        "{code}"
    );
    assert!(!code.contains("return ARRAYLEN"), "{code}");
}

#[test]
fn test_tuples_and_records() {
    let mut fx = Fixture::new();
    let pair_ty = fx.types.tuple(&[TypeId::INT64, TypeId::FLOAT64]);
    let px = fx.name("px");
    let py = fx.name("py");
    let point_name = fx.name("Point");
    let point_ty = fx
        .types
        .record(point_name, &[(px, TypeId::FLOAT64), (py, TypeId::FLOAT64)]);

    let (x_param, x) = fx.param("x", TypeId::INT64);
    let (f_param, f) = fx.param("f", TypeId::FLOAT64);
    let t = fx.local("t", pair_ty);
    let pt = fx.local("pt", point_ty);
    let out = fx.local("out", TypeId::FLOAT64);

    let elems = fx.ast.alloc_list(&[x, f]);
    let tuple = fx.ast.push(NodeKind::Tuple { elems }, pair_ty);
    let s1 = fx.assign(t, tuple);
    let second = fx
        .ast
        .push(NodeKind::TupleRef { tuple: t, index: 1 }, TypeId::FLOAT64);
    let fields = fx.ast.alloc_list(&[f, second]);
    let new = fx.ast.push(NodeKind::New { fields }, point_ty);
    let s2 = fx.assign(pt, new);
    let get = fx.ast.push(
        NodeKind::GetField {
            object: pt,
            field: py,
        },
        TypeId::FLOAT64,
    );
    let s3 = fx.assign(out, get);
    let body = fx.body(&[s1, s2, s3]);
    let def = fx.func("f", vec![x_param, f_param], TypeId::NOTHING, body);

    let code = fx.generate(&def, CodegenOptions::default()).unwrap().code;
    assert!(code.contains("struct tuple_1 {\nint64_t f1;\ndouble f2;\n};\n"), "{code}");
    assert!(code.contains("__t0 = (struct tuple_1) {x, f};\nt = __t0;\n"), "{code}");
    assert!(code.contains("pt = (struct Point) {f, t.f2};\n"), "{code}");
    assert!(code.contains("out = pt.py;\n"), "{code}");
}

#[test]
fn test_checked_convert_select_is() {
    let mut fx = Fixture::new();
    let (a_param, a) = fx.param("a", TypeId::INT64);
    let (b_param, b) = fx.param("b", TypeId::INT64);
    let r = fx.local("r", TypeId::INT64);
    let d = fx.local("d", TypeId::FLOAT64);
    let checked = fx.ast.push(
        NodeKind::Checked {
            op: arrc_ir::CheckedOp::Mul,
            left: a,
            right: b,
        },
        TypeId::INT64,
    );
    let same = fx.ast.push(NodeKind::Is { left: a, right: b }, TypeId::BOOL);
    let select = fx.ast.push(
        NodeKind::Select {
            cond: same,
            then_val: checked,
            else_val: b,
        },
        TypeId::INT64,
    );
    let s1 = fx.assign(r, select);
    let convert = fx.ast.push(NodeKind::Convert { operand: r }, TypeId::FLOAT64);
    let s2 = fx.assign(d, convert);
    let body = fx.body(&[s1, s2]);
    let def = fx.func("f", vec![a_param, b_param], TypeId::NOTHING, body);

    let code = fx.generate(&def, CodegenOptions::default()).unwrap().code;
    assert!(
        code.contains("r = ((a) == (b)) ? (checked_smul(a, b)) : (b);\n"),
        "{code}"
    );
    assert!(code.contains("d = (double)(r);\n"), "{code}");
}

#[test]
fn test_extend_fragment_copies_non_tail_text() {
    let fx = Fixture::new();
    let mut session =
        CompilationSession::new(&fx.interner, &fx.types, &fx.ast, CodegenOptions::default());
    let first = session.code.append("a = 1;\n").unwrap();
    session.code.append("b = 2;\n").unwrap();

    let mut lowerer = FunctionLowerer::new(&mut session, 0, &fx.scope);
    let extended = lowerer.extend_fragment(Some(first), "c = 3;\n").unwrap();
    let continued = lowerer.extend_fragment(Some(extended), "d = 4;\n").unwrap();
    assert_eq!(continued, extended);

    assert_eq!(session.code.get(first), "a = 1;\n");
    assert_eq!(session.code.get(extended), "a = 1;\nc = 3;\nd = 4;\n");
}
