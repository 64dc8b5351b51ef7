use super::ports::{NoInput, Pipe, read_fn, write_fn};
use super::*;
use crate::virtual_machine::isa::ParamKind;

const QUINE: [Word; 16] = [
    109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99,
];

/// Compares the input with 8: outputs 999 below, 1000 equal, 1001 above.
const CMP8: &str = "3,21,1008,21,8,20,1005,20,22,107,8,21,20,1006,20,31,\
                    1106,0,36,98,0,0,1002,21,125,20,4,20,1105,1,46,104,\
                    999,1105,1,46,1101,1000,1,20,4,20,1105,1,46,98,99";

fn program(source: &str) -> Program {
    source.parse().expect("bad test program")
}

fn run_vm(source: &str, inputs: &[Word]) -> VM {
    let mut vm = VM::with_inputs(program(source), inputs.iter().copied());
    assert_eq!(vm.run().expect("vm run failed"), Step::Halted);
    vm
}

fn run_outputs(source: &str, inputs: &[Word]) -> Vec<Word> {
    run_vm(source, inputs).into_ports().1
}

fn run_memory(source: &str) -> Vec<Word> {
    run_vm(source, &[]).memory().to_vec()
}

fn run_expect_err(source: &str, inputs: &[Word]) -> VMError {
    let mut vm = VM::with_inputs(program(source), inputs.iter().copied());
    vm.run().expect_err("expected failure")
}

fn run_bounded(source: &str) -> Result<VM, VMError> {
    let mut vm = VM::with_memory_model(
        program(source),
        MemoryModel::Bounded,
        VecDeque::new(),
        Vec::new(),
    );
    vm.run()?;
    Ok(vm)
}

// ==================== Arithmetic ====================

#[test]
fn add_in_place() {
    assert_eq!(run_memory("1,0,0,0,99"), vec![2, 0, 0, 0, 99]);
}

#[test]
fn mul_in_place() {
    assert_eq!(run_memory("2,3,0,3,99"), vec![2, 3, 0, 6, 99]);
    assert_eq!(run_memory("2,4,4,5,99,0"), vec![2, 4, 4, 5, 99, 9801]);
}

#[test]
fn self_modifying_program() {
    assert_eq!(
        run_memory("1,1,1,4,99,5,6,0,99"),
        vec![30, 1, 1, 4, 2, 5, 6, 0, 99]
    );
    assert_eq!(
        run_memory("1,9,10,3,2,3,11,0,99,30,40,50"),
        vec![3500, 9, 10, 70, 2, 3, 11, 0, 99, 30, 40, 50]
    );
}

#[test]
fn immediate_operands() {
    assert_eq!(run_memory("1002,4,3,4,33"), vec![1002, 4, 3, 4, 99]);
    assert_eq!(run_memory("1101,100,-1,4,0"), vec![1101, 100, -1, 4, 99]);
}

#[test]
fn add_wrapping() {
    let max = Word::MAX;
    let out = run_outputs(&format!("1101,{max},1,5,104,0,99"), &[]);
    assert_eq!(out, vec![Word::MIN]);
}

#[test]
fn mul_wrapping() {
    let out = run_outputs(&format!("1102,{},2,5,104,0,99", Word::MAX), &[]);
    assert_eq!(out, vec![-2]);
}

#[test]
fn large_numbers() {
    assert_eq!(
        run_outputs("104,1125899906842624,99", &[]),
        vec![1125899906842624]
    );
    let out = run_outputs("1102,34915192,34915192,7,4,7,99,0", &[]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].to_string().len(), 16);
}

#[test]
fn large_immediate_product() {
    assert_eq!(
        run_outputs("1102,1125899906842624,2,7,4,7,99,0", &[]),
        vec![2251799813685248]
    );
}

#[test]
fn runs_are_deterministic() {
    for source in [CMP8, "1,9,10,3,2,3,11,0,99,30,40,50"] {
        let first = run_vm(source, &[8]);
        let second = run_vm(source, &[8]);
        assert_eq!(first.memory(), second.memory(), "{source}");
        assert_eq!(first.output(), second.output(), "{source}");
        assert_eq!(first.steps(), second.steps(), "{source}");
    }
}

// ==================== Comparisons and jumps ====================

#[test]
fn equals_position_mode() {
    let source = "3,9,8,9,10,9,4,9,99,-1,8";
    assert_eq!(run_outputs(source, &[8]), vec![1]);
    assert_eq!(run_outputs(source, &[7]), vec![0]);
}

#[test]
fn equals_immediate_mode() {
    let source = "3,3,1108,-1,8,3,4,3,99";
    assert_eq!(run_outputs(source, &[8]), vec![1]);
    assert_eq!(run_outputs(source, &[-8]), vec![0]);
}

#[test]
fn less_than_both_modes() {
    for source in ["3,9,7,9,10,9,4,9,99,-1,8", "3,3,1107,-1,8,3,4,3,99"] {
        assert_eq!(run_outputs(source, &[5]), vec![1], "{source}");
        assert_eq!(run_outputs(source, &[8]), vec![0], "{source}");
        assert_eq!(run_outputs(source, &[9]), vec![0], "{source}");
    }
}

#[test]
fn jumps_test_zero() {
    for source in [
        "3,12,6,12,15,1,13,14,13,4,13,99,-1,0,1,9",
        "3,3,1105,-1,9,1101,0,0,12,4,12,99,1",
    ] {
        assert_eq!(run_outputs(source, &[0]), vec![0], "{source}");
        assert_eq!(run_outputs(source, &[3]), vec![1], "{source}");
    }
}

#[test]
fn compare_with_eight() {
    assert_eq!(run_outputs(CMP8, &[7]), vec![999]);
    assert_eq!(run_outputs(CMP8, &[8]), vec![1000]);
    assert_eq!(run_outputs(CMP8, &[9]), vec![1001]);
}

#[test]
fn jump_target_is_taken_verbatim() {
    // JNZ 1, 6 skips the OUT at 3
    let vm = run_vm("1105,1,6,104,7,99,104,8,99", &[]);
    assert_eq!(vm.output(), &vec![8]);
    assert_eq!(vm.ip(), 8);
}

#[test]
fn untaken_jump_advances_three() {
    let vm = run_vm("1106,1,0,99", &[]);
    assert_eq!(vm.ip(), 3);
    assert_eq!(vm.steps(), 2);
}

// ==================== Relative mode ====================

#[test]
fn quine() {
    assert_eq!(run_outputs(&Program::from(QUINE).to_string(), &[]), QUINE);
}

#[test]
fn adjust_base_accumulates() {
    let vm = run_vm("109,19,109,-34,99", &[]);
    assert_eq!(vm.relative_base(), -15);
}

#[test]
fn relative_write_target() {
    // base = 10; IN into base + 2; OUT from base + 2
    let out = run_outputs("109,10,203,2,204,2,99", &[-77]);
    assert_eq!(out, vec![-77]);
}

// ==================== Memory ====================

#[test]
fn memory_extends_beyond_program() {
    let vm = run_vm("1101,5,6,1000,4,1000,4,2000,99", &[]);
    assert_eq!(vm.output(), &vec![11, 0]);
    assert_eq!(vm.peek(1000), 11);
    assert_eq!(vm.peek(2000), 0);
    assert_eq!(vm.memory().len(), 9);
}

#[test]
fn bounded_memory_rejects_overflow() {
    let err = run_bounded("1101,5,6,1000,99").err();
    assert_eq!(
        err,
        Some(VMError::AddressOutOfBounds {
            address: 1000,
            len: 5
        })
    );
}

#[test]
fn bounded_memory_halts_when_ip_leaves_program() {
    let vm = run_bounded("1101,5,6,0").unwrap();
    assert_eq!(vm.status(), Status::Halted);
    assert_eq!(vm.memory(), &[11, 5, 6, 0]);
    assert_eq!(vm.memory_model(), MemoryModel::Bounded);
}

#[test]
fn bounded_memory_rejects_truncated_parameters() {
    assert_eq!(
        run_bounded("1101,5").err(),
        Some(VMError::AddressOutOfBounds { address: 2, len: 2 })
    );
}

#[test]
fn bounded_input_out_of_range_keeps_the_value() {
    let mut vm = VM::with_memory_model(
        program("3,100,99"),
        MemoryModel::Bounded,
        VecDeque::from(vec![5]),
        Vec::<Word>::new(),
    );
    assert_eq!(
        vm.step().unwrap_err(),
        VMError::AddressOutOfBounds {
            address: 100,
            len: 3
        }
    );
    assert_eq!(vm.input(), &VecDeque::from(vec![5]));
    assert_eq!(vm.ip(), 0);
    assert_eq!(vm.memory(), &[3, 100, 99]);
}

#[test]
fn bounded_arithmetic_out_of_range_writes_nothing() {
    let mut vm = VM::with_memory_model(
        program("1101,2,3,9,99"),
        MemoryModel::Bounded,
        VecDeque::new(),
        Vec::<Word>::new(),
    );
    assert!(vm.step().is_err());
    assert_eq!(vm.memory(), &[1101, 2, 3, 9, 99]);
    assert_eq!(vm.steps(), 0);
}

// ==================== Errors ====================

#[test]
fn invalid_opcode() {
    assert_eq!(
        run_expect_err("1101,1,1,7,42", &[]),
        VMError::InvalidOpcode {
            opcode: 42,
            word: 42,
            ip: 4
        }
    );
}

#[test]
fn falling_off_extended_memory_hits_opcode_zero() {
    assert!(matches!(
        run_expect_err("104,1", &[]),
        VMError::InvalidOpcode {
            opcode: 0,
            ip: 2,
            ..
        }
    ));
}

#[test]
fn invalid_mode() {
    assert_eq!(
        run_expect_err("30001,0,0,0,99", &[]),
        VMError::InvalidMode {
            mode: 3,
            param: 3,
            ip: 0
        }
    );
}

#[test]
fn immediate_write_target() {
    assert_eq!(
        run_expect_err("11101,1,1,0,99", &[]),
        VMError::ImmediateWrite { param: 3, ip: 0 }
    );
    assert_eq!(
        run_expect_err("103,0,99", &[5]),
        VMError::ImmediateWrite { param: 1, ip: 0 }
    );
}

/// Every handler resolves its parameters with the roles the ISA table declares:
/// an all-immediate instruction fails exactly on its `Dst` parameter.
#[test]
fn dispatch_roles_match_isa_table() {
    for &instr in Instruction::ALL {
        let params = instr.params();
        let immediate: Word = (0..params.len() as u32).map(|i| 10_i64.pow(i + 2)).sum();
        let mut words = vec![instr as Word + immediate];
        words.extend(std::iter::repeat_n(0, params.len()));
        words.push(99);

        let mut vm = VM::with_inputs(Program::from(words), [1]);
        let result = vm.step();
        match params.iter().position(|k| *k == ParamKind::Dst) {
            Some(index) => assert_eq!(
                result,
                Err(VMError::ImmediateWrite {
                    param: index + 1,
                    ip: 0
                }),
                "{instr:?}"
            ),
            None => assert!(result.is_ok(), "{instr:?}"),
        }
    }
}

#[test]
fn negative_address() {
    assert_eq!(
        run_expect_err("4,-1,99", &[]),
        VMError::NegativeAddress { address: -1, ip: 0 }
    );
    assert_eq!(
        run_expect_err("109,-5,204,2,99", &[]),
        VMError::NegativeAddress { address: -3, ip: 2 }
    );
}

#[test]
fn negative_jump_target() {
    assert_eq!(
        run_expect_err("1105,1,-4,99", &[]),
        VMError::NegativeAddress { address: -4, ip: 0 }
    );
}

#[test]
fn error_leaves_state_for_inspection() {
    let mut vm = VM::with_inputs(program("1101,2,3,7,4,-1,99,0"), []);
    assert!(vm.run().is_err());
    assert_eq!(vm.ip(), 4);
    assert_eq!(vm.peek(7), 5);
    assert_eq!(vm.steps(), 1);
    assert!(vm.is_running());
}

// ==================== Lifecycle ====================

#[test]
fn status_transitions() {
    let mut vm = VM::with_inputs(program("104,1,99"), []);
    assert_eq!(vm.status(), Status::Ready);
    assert!(vm.is_running());

    assert_eq!(vm.step().unwrap(), Step::Continue);
    assert_eq!(vm.status(), Status::Running);

    assert_eq!(vm.step().unwrap(), Step::Halted);
    assert_eq!(vm.status(), Status::Halted);
    assert!(!vm.is_running());
    assert_eq!(vm.steps(), 2);
}

#[test]
fn stepping_halted_vm_is_a_no_op() {
    let mut vm = run_vm("104,1,99", &[]);
    let ip = vm.ip();
    for _ in 0..3 {
        assert_eq!(vm.step().unwrap(), Step::Halted);
    }
    assert_eq!(vm.ip(), ip);
    assert_eq!(vm.output(), &vec![1]);
}

#[test]
fn empty_program_starts_halted() {
    let mut vm = VM::with_inputs(Program::default(), []);
    assert_eq!(vm.status(), Status::Halted);
    assert_eq!(vm.run().unwrap(), Step::Halted);
    assert_eq!(vm.steps(), 0);
}

#[test]
fn load_resets_registers_and_keeps_ports() {
    let mut vm = run_vm("109,5,3,0,99", &[1, 2]);
    assert_eq!(vm.relative_base(), 5);

    vm.load(program("3,0,4,0,99"));
    assert_eq!(vm.status(), Status::Ready);
    assert_eq!((vm.ip(), vm.relative_base(), vm.steps()), (0, 0, 0));

    assert_eq!(vm.run().unwrap(), Step::Halted);
    assert_eq!(vm.output(), &vec![2]);
}

// ==================== Suspension ====================

#[test]
fn blocked_input_changes_nothing() {
    let mut vm = VM::new(program("1101,1,2,9,3,0,4,0,99,0"), NoInput, Vec::<Word>::new());
    assert_eq!(vm.step().unwrap(), Step::Continue);
    let before = vm.memory().to_vec();

    for _ in 0..5 {
        assert_eq!(vm.step().unwrap(), Step::Blocked);
        assert_eq!(vm.status(), Status::Blocked);
        assert_eq!(vm.ip(), 4);
        assert_eq!(vm.memory(), before.as_slice());
        assert_eq!(vm.steps(), 1);
        assert!(vm.is_running());
    }
}

#[test]
fn blocked_vm_resumes_once_input_arrives() {
    let mut vm = VM::with_inputs(program("3,0,4,0,99"), []);
    assert_eq!(vm.run().unwrap(), Step::Blocked);
    assert_eq!(vm.run().unwrap(), Step::Blocked);

    vm.input_mut().push_back(42);
    assert_eq!(vm.run().unwrap(), Step::Halted);
    assert_eq!(vm.output(), &vec![42]);
    assert!(vm.input().is_empty());
}

#[test]
fn blocked_read_polls_again_on_retry() {
    let mut polls = 0;
    let input = read_fn(|| {
        polls += 1;
        (polls == 3).then_some(6)
    });
    let mut vm = VM::new(program("3,0,99"), input, Vec::<Word>::new());
    assert_eq!(vm.step().unwrap(), Step::Blocked);
    assert_eq!(vm.step().unwrap(), Step::Blocked);
    assert_eq!(vm.step().unwrap(), Step::Continue);
    assert_eq!(vm.peek(0), 6);
    drop(vm);
    assert_eq!(polls, 3);
}

// ==================== Ports ====================

#[test]
fn outputs_in_emission_order() {
    let mut seen = Vec::new();
    let mut vm = VM::new(
        program("104,3,104,-1,104,0,99"),
        NoInput,
        write_fn(|v| seen.push(v)),
    );
    vm.run().unwrap();
    drop(vm);
    assert_eq!(seen, vec![3, -1, 0]);
}

#[test]
fn piped_machines_stream_values() {
    // doubles every input until it reads 0
    let doubler = program("3,100,1006,100,14,1002,100,2,101,4,101,1105,1,0,99");
    let link = Pipe::new();
    let mut first = VM::new(program("104,5,104,9,104,0,99"), NoInput, link.clone());
    let mut second = VM::new(doubler, link.clone(), Vec::<Word>::new());

    assert_eq!(second.run().unwrap(), Step::Blocked);
    assert_eq!(first.run().unwrap(), Step::Halted);
    assert_eq!(link.len(), 3);
    assert_eq!(second.run().unwrap(), Step::Halted);
    assert_eq!(second.output(), &vec![10, 18]);
    assert!(link.is_empty());
}

#[test]
fn borrowed_ports() {
    let mut input: VecDeque<Word> = VecDeque::from(vec![4, 5]);
    let mut output: Vec<Word> = Vec::new();
    {
        let mut vm = VM::new(program("3,0,3,1,1,0,1,0,4,0,99"), &mut input, &mut output);
        vm.run().unwrap();
    }
    assert!(input.is_empty());
    assert_eq!(output, vec![9]);
}
