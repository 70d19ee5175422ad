use std::path::Path;

use vmtranslator_rust::model::STACK_BASE;
use vmtranslator_rust::parser::load;
use vmtranslator_rust::processor;
use vmtranslator_rust::processor::emulator::Emulator;

const SP: u16 = 0;
const LCL: u16 = 1;
const ARG: u16 = 2;

fn emulate(fixture: &str, setup: &[(u16, i16)]) -> Emulator {
    let raw = load(&Path::new("tests/fixtures").join(fixture)).expect("fixture loads");
    let translated = processor::run(&raw).expect("fixture translates");

    let mut emu = Emulator::new(&translated.assembly);
    for &(addr, value) in setup {
        emu.poke(addr, value);
    }
    emu.run(200_000).expect("program halts");
    emu
}

#[test]
fn simple_add_leaves_sum_on_stack() {
    let emu = emulate("SimpleAdd.vm", &[(SP, STACK_BASE as i16)]);
    assert_eq!(emu.peek(SP), 257);
    assert_eq!(emu.peek(256), 15);
}

#[test]
fn basic_loop_sums_down_to_zero() {
    let emu = emulate(
        "BasicLoop.vm",
        &[(SP, 256), (LCL, 300), (ARG, 400), (400, 3)],
    );
    assert_eq!(emu.peek(SP), 257);
    assert_eq!(emu.peek(256), 6);
}

#[test]
fn recursive_fibonacci_program() {
    // bootstrap sets up SP itself
    let emu = emulate("FibonacciElement", &[]);
    assert_eq!(emu.peek(SP), 262);
    assert_eq!(emu.peek(261), 3);
}

#[test]
fn statics_do_not_collide_across_classes() {
    let emu = emulate("StaticsTest", &[]);
    assert_eq!(emu.peek(SP), 263);
    assert_eq!(emu.peek(261), -2);
    assert_eq!(emu.peek(262), 8);
}

#[test]
fn static_blocks_follow_pop_count() {
    let raw = load(Path::new("tests/fixtures/StaticsTest")).unwrap();
    let translated = processor::run(&raw).unwrap();
    let text: Vec<String> = translated.assembly.iter().map(|i| i.to_string()).collect();

    // Class1 pops statics 0 and 1, so Class2 starts two cells later.
    for addr in ["@100", "@101", "@102", "@103"] {
        assert!(text.iter().any(|l| l == addr), "missing {addr}");
    }
    assert!(!text.iter().any(|l| l == "@104"));
}
