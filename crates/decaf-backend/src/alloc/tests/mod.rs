use std::collections::BTreeSet;

use decaf_common::names::NameGenerator;
use decaf_common::tac::{
    Assignment, BinaryOp, Inst, Instruction, LocationId, Locations, Program, Register, TacBuilder,
};
use decaf_common::Failure;

use super::{
    color, eliminate, interference, is_dead, liveness, regalloc, segment, Analysis, Coloring,
    Driver, FunctionReport, Interference, Order, Region,
};
use crate::mips::CONSTRAINTS;

fn set(ids: &[LocationId]) -> BTreeSet<LocationId> {
    ids.iter().copied().collect()
}

fn live(set: impl IntoIterator<Item = LocationId>) -> BTreeSet<LocationId> {
    set.into_iter().collect()
}

fn analyze(program: &Program) -> (Analysis, Interference) {
    let regions = segment(program).unwrap();
    assert_eq!(1, regions.len());

    let analysis = eliminate(&program.code, &regions[0]).unwrap();
    let graph = interference(&program.code, &analysis.flow, &analysis.liveness);
    (analysis, graph)
}

fn assert_symmetric(graph: &Interference) {
    for (node, neighbours) in graph.graph.iter() {
        assert!(!neighbours.contains(node), "{node:?} interferes with itself");
        for other in neighbours {
            assert!(graph.interferes(other, node));
        }
    }
}

fn assert_valid(graph: &Interference, coloring: &Coloring) {
    for node in graph.nodes() {
        assert!(coloring.assignments.contains_key(&node), "{node:?} is uncolored");
    }

    for (a, b) in graph.edges() {
        if let (Some(ra), Some(rb)) = (coloring.register(&a), coloring.register(&b)) {
            assert_ne!(ra, rb, "{a:?} and {b:?} interfere but share a register");
        }
    }
}

#[test]
fn scenario_straight_line_add() {
    let mut names = NameGenerator::new();
    let mut builder = TacBuilder::new(&mut names);
    builder.label("main");
    builder.begin_func(Vec::<String>::new(), false).unwrap();
    let t0 = builder.load_constant(3);
    let t1 = builder.load_constant(4);
    let t2 = builder.binary(BinaryOp::Add, t0, t1);
    builder.ret(Some(t2));
    builder.end_func().unwrap();
    let program = builder.build().unwrap();

    let (analysis, graph) = analyze(&program);

    assert!(analysis.removed.is_empty());
    assert_eq!(vec![3], analysis.flow.succs(&2).collect::<Vec<_>>());
    assert_eq!(vec![4], analysis.flow.succs(&3).collect::<Vec<_>>());
    assert_eq!(vec![5], analysis.flow.succs(&4).collect::<Vec<_>>());
    assert_eq!(0, analysis.flow.succs(&5).count());

    assert_eq!(set(&[t0, t1]), live(analysis.liveness.live_in(&4)));
    assert_eq!(set(&[t2]), live(analysis.liveness.live_out(&4)));

    assert!(graph.interferes(&t0, &t1));
    assert!(!graph.interferes(&t2, &t0));
    assert!(!graph.interferes(&t2, &t1));
    assert_eq!(3, graph.len());
    assert_symmetric(&graph);
}

#[test]
fn scenario_unused_constant_is_removed() {
    let mut names = NameGenerator::new();
    let mut builder = TacBuilder::new(&mut names);
    builder.label("main");
    builder.begin_func(Vec::<String>::new(), false).unwrap();
    let t0 = builder.load_constant(5);
    let t1 = builder.load_constant(6);
    builder.ret(Some(t1));
    builder.end_func().unwrap();
    let mut program = builder.build().unwrap();

    let (analysis, graph) = analyze(&program);
    assert_eq!(vec![2], analysis.removed);
    assert!(!graph.graph.contains_key(&t0));

    let reports = regalloc(&CONSTRAINTS, &mut program, &mut ()).unwrap();
    assert_eq!(1, reports[0].removed);
    assert_eq!(5, program.code.len());
    assert!(!program
        .code
        .iter()
        .any(|inst| matches!(inst.inst(), Inst::LoadConstant { value: 5, .. })));

    assert_eq!(Some(Assignment::Memory), program.locations.assignment(&t0));
    assert!(matches!(
        program.locations.assignment(&t1),
        Some(Assignment::Register(_))
    ));
}

fn branching() -> (Program, LocationId, LocationId) {
    let mut names = NameGenerator::new();
    let mut builder = TacBuilder::new(&mut names);
    builder.label("f");
    let frame = builder.begin_func(["t0"], false).unwrap();
    let t0 = frame.formals[0];
    let t1 = builder.local("t1");

    builder.if_z(t0, "L");
    builder.emit(Inst::LoadConstant { dst: t1, value: 1 });
    builder.goto("End");
    builder.label("L");
    builder.emit(Inst::LoadConstant { dst: t1, value: 2 });
    builder.label("End");
    builder.ret(Some(t1));
    builder.end_func().unwrap();

    (builder.build().unwrap(), t0, t1)
}

#[test]
fn scenario_both_arms_define_the_same_location() {
    let (program, t0, t1) = branching();
    let (analysis, graph) = analyze(&program);

    assert!(analysis.removed.is_empty());
    assert_eq!(vec![6, 3], analysis.flow.succs(&2).collect::<Vec<_>>());
    assert_eq!(vec![8], analysis.flow.succs(&4).collect::<Vec<_>>());
    assert_eq!(vec![2, 5], analysis.flow.preds(&6).collect::<Vec<_>>());

    assert_eq!(set(&[t0]), live(analysis.liveness.live_in(&2)));
    assert_eq!(set(&[t1]), live(analysis.liveness.live_out(&3)));
    assert_eq!(set(&[t1]), live(analysis.liveness.live_out(&6)));

    assert!(!graph.interferes(&t0, &t1));
    assert_eq!(0, graph.neighbours(&t1).count());
}

fn crowded() -> (Program, Vec<LocationId>) {
    let mut names = NameGenerator::new();
    let mut builder = TacBuilder::new(&mut names);
    builder.label("crowded");
    builder.begin_func(Vec::<String>::new(), false).unwrap();

    let values: Vec<_> = (1..=5).map(|i| builder.load_constant(i)).collect();
    let mut sum = values[0];
    for value in values[1..].iter() {
        sum = builder.binary(BinaryOp::Add, sum, *value);
    }

    builder.ret(Some(sum));
    builder.end_func().unwrap();

    (builder.build().unwrap(), values)
}

#[test]
fn scenario_too_few_registers_forces_removal() {
    let (program, values) = crowded();
    let (_, graph) = analyze(&program);

    for a in values.iter() {
        for b in values.iter().filter(|b| b != &a) {
            assert!(graph.interferes(a, b));
        }
    }

    let pool = CONSTRAINTS.with_budget(2).pool();
    let coloring = color(&graph, &pool, None);

    assert!(!coloring.forced.is_empty());
    assert!(!coloring.spilled.is_empty());
    assert_valid(&graph, &coloring);

    for spilled in coloring.spilled.iter() {
        assert_eq!(Some(&Assignment::Memory), coloring.assignments.get(spilled));
    }
}

#[test]
fn enough_registers_means_nothing_is_forced() {
    let (program, _) = crowded();
    let (_, graph) = analyze(&program);

    let coloring = color(&graph, &CONSTRAINTS.pool(), None);

    assert!(coloring.forced.is_empty());
    assert!(coloring.spilled.is_empty());
    assert_valid(&graph, &coloring);
}

#[test]
fn liveness_does_not_depend_on_visit_order() {
    for program in [branching().0, crowded().0] {
        let (analysis, _) = analyze(&program);

        let forward = liveness(&program.code, &analysis.flow, Order::Forward);
        let reverse = liveness(&program.code, &analysis.flow, Order::Reverse);

        assert_eq!(forward.live_in, reverse.live_in);
        assert_eq!(forward.live_out, reverse.live_out);
        assert!(reverse.passes <= forward.passes);
    }
}

#[test]
fn liveness_reaches_around_loops() {
    let mut names = NameGenerator::new();
    let mut builder = TacBuilder::new(&mut names);
    builder.label("count");
    let frame = builder.begin_func(["n"], false).unwrap();
    let n = frame.formals[0];
    let i = builder.load_constant(0);
    let one = builder.load_constant(1);
    builder.label("_L0");
    let cmp = builder.binary(BinaryOp::Less, i, n);
    builder.if_z(cmp, "_L1");
    builder.emit(Inst::Binary {
        op: BinaryOp::Add,
        dst: i,
        lhs: i,
        rhs: one,
    });
    builder.goto("_L0");
    builder.label("_L1");
    builder.ret(Some(i));
    builder.end_func().unwrap();
    let program = builder.build().unwrap();

    let (analysis, graph) = analyze(&program);

    assert!(analysis.removed.is_empty());
    assert_eq!(set(&[i, n, one]), live(analysis.liveness.live_in(&5)));
    assert!(graph.interferes(&one, &n));
    assert!(graph.interferes(&i, &cmp));

    let forward = liveness(&program.code, &analysis.flow, Order::Forward);
    assert_eq!(forward.live_in, analysis.liveness.live_in);
}

#[test]
fn dead_code_goes_away_in_rounds() {
    let mut names = NameGenerator::new();
    let mut builder = TacBuilder::new(&mut names);
    builder.label("main");
    builder.begin_func(Vec::<String>::new(), false).unwrap();
    let a = builder.load_constant(1);
    let b = builder.binary(BinaryOp::Mul, a, a);
    let _ = builder.binary(BinaryOp::Add, b, a);
    let kept = builder.load_constant(2);
    builder.ret(Some(kept));
    builder.end_func().unwrap();
    let mut program = builder.build().unwrap();

    let (analysis, _) = analyze(&program);
    assert_eq!(vec![2, 3, 4], analysis.removed);

    for id in analysis.body.iter() {
        let out = analysis.liveness.live_out(id);
        assert!(!is_dead(&program.code[*id], &out));
    }

    regalloc(&CONSTRAINTS, &mut program, &mut ()).unwrap();
    let regions = segment(&program).unwrap();
    let again = eliminate(&program.code, &regions[0]).unwrap();
    assert!(again.removed.is_empty());
}

#[test]
fn effects_are_never_removed() {
    let mut names = NameGenerator::new();
    let mut builder = TacBuilder::new(&mut names);
    builder.label("main");
    builder.begin_func(Vec::<String>::new(), false).unwrap();
    let obj = builder.temp();
    let value = builder.load_constant(3);
    builder.store(obj, value, 4);
    let field = builder.reference(obj, 8);
    builder.assign(field, value);
    let _ = builder.lcall("_ReadInteger", true);
    builder.end_func().unwrap();
    let program = builder.build().unwrap();

    let (analysis, graph) = analyze(&program);

    assert!(analysis.removed.is_empty());
    assert!(graph.graph.contains_key(&obj));
    assert!(!graph.graph.contains_key(&field));
}

#[test]
fn statics_stay_out_of_the_graph() {
    let mut names = NameGenerator::new();
    let mut builder = TacBuilder::new(&mut names);
    let global = builder.global("count");
    builder.label("main");
    builder.begin_func(Vec::<String>::new(), false).unwrap();
    let value = builder.load_constant(3);
    builder.assign(global, value);
    let read = builder.temp();
    builder.assign(read, global);
    builder.ret(Some(read));
    builder.end_func().unwrap();
    let mut program = builder.build().unwrap();

    let (analysis, graph) = analyze(&program);
    assert!(analysis.removed.is_empty());
    assert!(!graph.graph.contains_key(&global));

    regalloc(&CONSTRAINTS, &mut program, &mut ()).unwrap();
    assert_eq!(Some(Assignment::Memory), program.locations.assignment(&global));
}

#[test]
fn formals_interfere_from_the_start() {
    let mut names = NameGenerator::new();
    let mut builder = TacBuilder::new(&mut names);
    builder.label("add");
    let frame = builder.begin_func(["a", "b"], false).unwrap();
    let (a, b) = (frame.formals[0], frame.formals[1]);
    let sum = builder.binary(BinaryOp::Add, a, b);
    builder.ret(Some(sum));
    builder.end_func().unwrap();
    let program = builder.build().unwrap();

    let (analysis, graph) = analyze(&program);

    assert_eq!(set(&[a, b]), *program.code[1].defines());
    assert!(analysis.liveness.live_in(&1).is_empty());
    assert!(graph.interferes(&a, &b));
}

#[test]
fn receiver_keeps_its_own_register() {
    let mut names = NameGenerator::new();
    let mut builder = TacBuilder::new(&mut names);
    builder.label("_Cow.Moo");
    let frame = builder.begin_func(["loud"], true).unwrap();
    let this = frame.receiver.unwrap();
    let loud = frame.formals[0];

    let field = builder.load(this, 4);
    let sum = builder.binary(BinaryOp::Add, field, loud);
    builder.store(this, sum, 8);
    builder.ret(None);
    builder.end_func().unwrap();
    let mut program = builder.build().unwrap();

    let (_, graph) = analyze(&program);
    assert!(graph.interferes(&this, &loud));

    let pool = CONSTRAINTS.with_budget(1).pool();
    let coloring = color(&graph, &pool, Some((this, CONSTRAINTS.receiver())));
    assert_eq!(Some(CONSTRAINTS.receiver()), coloring.register(&this));
    assert_valid(&graph, &coloring);

    regalloc(&CONSTRAINTS, &mut program, &mut ()).unwrap();
    assert_eq!(
        Some(Assignment::Register(Register(23))),
        program.locations.assignment(&this)
    );

    for neighbour in graph.neighbours(&this) {
        assert_ne!(
            Some(Assignment::Register(Register(23))),
            program.locations.assignment(&neighbour)
        );
    }
}

#[test]
fn every_tracked_location_ends_up_somewhere() {
    let (mut program, _, _) = branching();
    regalloc(&CONSTRAINTS.with_budget(0), &mut program, &mut ()).unwrap();

    for (id, location) in program.locations.iter() {
        if !location.is_reference() {
            assert_eq!(Some(Assignment::Memory), program.locations.assignment(&id));
        }
    }
}

#[test]
fn jumps_to_missing_labels_fail() {
    let mut names = NameGenerator::new();
    let mut builder = TacBuilder::new(&mut names);
    builder.label("main");
    builder.begin_func(Vec::<String>::new(), false).unwrap();
    builder.goto("_nowhere");
    builder.end_func().unwrap();
    let mut program = builder.build().unwrap();

    assert_eq!(
        Err(Failure::UndefinedLabel {
            label: "_nowhere".into(),
            at: 2
        }),
        regalloc(&CONSTRAINTS, &mut program, &mut ())
    );
}

#[test]
fn labels_in_other_functions_are_out_of_reach() {
    let mut names = NameGenerator::new();
    let mut builder = TacBuilder::new(&mut names);
    builder.label("f");
    builder.begin_func(Vec::<String>::new(), false).unwrap();
    builder.label("_L0");
    builder.ret(None);
    builder.end_func().unwrap();
    builder.label("g");
    builder.begin_func(Vec::<String>::new(), false).unwrap();
    builder.goto("_L0");
    builder.end_func().unwrap();
    let mut program = builder.build().unwrap();

    let err = regalloc(&CONSTRAINTS, &mut program, &mut ()).unwrap_err();
    assert_eq!(7, err.at());
}

fn raw(insts: Vec<Inst>) -> Program {
    let locations = Locations::new();
    let code = insts
        .into_iter()
        .map(|inst| Instruction::new(inst, &locations))
        .collect();

    Program {
        code,
        locations,
        globals: Vec::new(),
    }
}

#[test]
fn functions_are_found_between_their_brackets() {
    let program = raw(vec![
        Inst::Label("main".into()),
        Inst::BeginFunc(Default::default()),
        Inst::Return(None),
        Inst::EndFunc,
        Inst::VTable {
            label: "Cow".into(),
            methods: vec![],
        },
        Inst::BeginFunc(Default::default()),
        Inst::EndFunc,
    ]);

    let regions = segment(&program).unwrap();
    assert_eq!(
        vec![
            Region {
                name: "main".into(),
                begin: 1,
                end: 3
            },
            Region {
                name: "<function at 5>".into(),
                begin: 5,
                end: 6
            },
        ],
        regions
    );
}

#[test]
fn malformed_brackets_fail() {
    let stray = raw(vec![Inst::Return(None), Inst::EndFunc]);
    assert_eq!(Err(Failure::UnmatchedEnd { at: 1 }), segment(&stray));

    let nested = raw(vec![
        Inst::BeginFunc(Default::default()),
        Inst::BeginFunc(Default::default()),
        Inst::EndFunc,
    ]);
    assert_eq!(Err(Failure::UnclosedFunction { at: 0 }), segment(&nested));

    let open = raw(vec![Inst::Label("f".into()), Inst::BeginFunc(Default::default())]);
    assert_eq!(Err(Failure::UnclosedFunction { at: 1 }), segment(&open));
}

#[derive(Default)]
struct Recorder {
    reports: Vec<FunctionReport>,
    graphs: Vec<(String, usize)>,
}

impl Driver for Recorder {
    fn report(&mut self, report: &FunctionReport) {
        self.reports.push(report.clone());
    }

    fn inspect(&mut self, name: &str, _: &Locations, graph: &Interference, _: &Coloring) {
        self.graphs.push((name.into(), graph.len()));
    }
}

#[test]
fn driver_hears_about_every_function() {
    let (mut program, _) = crowded();
    let mut recorder = Recorder::default();

    let reports = regalloc(&CONSTRAINTS.with_budget(2), &mut program, &mut recorder).unwrap();

    assert_eq!(reports, recorder.reports);
    assert_eq!(vec![("crowded".to_string(), 9)], recorder.graphs);
    assert_eq!("crowded", reports[0].name);
    assert!(!reports[0].forced.is_empty());
    assert!(!reports[0].spilled.is_empty());
}
