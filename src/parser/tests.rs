use super::ast::{DirInstruction, OpInstruction, SingleBody, StatementKind};
use super::parse_line;
use crate::error::ErrorKind;
use crate::tables::{DirId, OpId};

fn ok(line: &str) -> StatementKind {
    let (stmt, err) = parse_line(line, 1);
    assert!(err.is_none(), "unexpected error parsing {line:?}: {err:?}");
    stmt.kind
}

fn err(line: &str) -> ErrorKind {
    let (_, err) = parse_line(line, 1);
    err.expect("expected a parse error").kind
}

#[test]
fn add_three_register_operation() {
    let (stmt, err) = parse_line("MAIN: add $1, $2, $3", 1);
    assert!(err.is_none());
    assert_eq!(stmt.label.as_deref(), Some("MAIN"));
    assert_eq!(
        stmt.kind,
        StatementKind::Operation(OpInstruction::R { op: OpId::Add, funct: 1, rs: 1, rt: 2, rd: 3 })
    );
}

#[test]
fn move_family_is_two_operand() {
    let kind = ok("move $4, $5");
    assert_eq!(
        kind,
        StatementKind::Operation(OpInstruction::R { op: OpId::Move, funct: 1, rs: 4, rt: 0, rd: 5 })
    );
}

#[test]
fn branch_takes_two_registers_then_a_label() {
    let kind = ok("bne $1, $2, LOOP");
    assert_eq!(
        kind,
        StatementKind::Operation(OpInstruction::I {
            op: OpId::Bne,
            rs: 1,
            rt: 2,
            immed: 0,
            label: Some("LOOP".into()),
        })
    );
}

#[test]
fn arith_immediate_is_reg_immed_reg() {
    let kind = ok("addi $1, 100, $2");
    assert_eq!(
        kind,
        StatementKind::Operation(OpInstruction::I {
            op: OpId::Addi,
            rs: 1,
            rt: 2,
            immed: 100,
            label: None,
        })
    );
}

#[test]
fn jmp_accepts_a_register() {
    let kind = ok("jmp $7");
    assert_eq!(
        kind,
        StatementKind::Operation(OpInstruction::J { op: OpId::Jmp, reg_flag: true, addr: 7, label: None })
    );
}

#[test]
fn jmp_accepts_a_label() {
    let kind = ok("jmp LOOP");
    assert_eq!(
        kind,
        StatementKind::Operation(OpInstruction::J {
            op: OpId::Jmp,
            reg_flag: false,
            addr: 0,
            label: Some("LOOP".into()),
        })
    );
}

#[test]
fn stop_takes_no_operands() {
    let kind = ok("stop");
    assert_eq!(
        kind,
        StatementKind::Operation(OpInstruction::J { op: OpId::Stop, reg_flag: false, addr: 0, label: None })
    );
}

#[test]
fn asciz_directive() {
    let kind = ok(r#"STR: .asciz "hi""#);
    assert_eq!(
        kind,
        StatementKind::Directive(DirInstruction::Single {
            dir: DirId::Asciz,
            body: SingleBody::Str("hi".into()),
        })
    );
}

#[test]
fn entry_directive_takes_a_label() {
    let kind = ok(".entry MAIN");
    assert_eq!(
        kind,
        StatementKind::Directive(DirInstruction::Single {
            dir: DirId::Entry,
            body: SingleBody::Label("MAIN".into()),
        })
    );
}

#[test]
fn db_array_directive() {
    let kind = ok(".db 1, 2, 3");
    assert_eq!(
        kind,
        StatementKind::Directive(DirInstruction::Array { dir: DirId::Db, width: 1, values: vec![1, 2, 3] })
    );
}

#[test]
fn blank_line_is_end() {
    assert_eq!(ok("   "), StatementKind::End);
}

#[test]
fn comment_only_line_is_ignore() {
    assert_eq!(ok("; a comment"), StatementKind::Ignore);
}

#[test]
fn label_colliding_with_mnemonic_is_rejected() {
    assert_eq!(err("add: add $1, $2, $3"), ErrorKind::InvalLabel);
}

#[test]
fn label_over_32_chars_is_rejected() {
    let long = "a".repeat(33);
    assert_eq!(err(&format!("{long}: add $1, $2, $3")), ErrorKind::LongLabel);
}

#[test]
fn label_at_32_chars_is_accepted() {
    let at_max = "a".repeat(32);
    assert!(matches!(ok(&format!("{at_max}: stop")), StatementKind::Operation(_)));
}

#[test]
fn oversize_line_is_rejected() {
    let line = format!("add $1, $2, $3 {}", " ".repeat(70));
    assert_eq!(err(&line), ErrorKind::LongLine);
}

#[test]
fn out_of_range_register_is_rejected() {
    assert_eq!(err("add $32, $1, $1"), ErrorKind::InvalReg);
}

#[test]
fn invalid_directive_is_rejected() {
    assert_eq!(err(".nope X"), ErrorKind::InvalDir);
}

#[test]
fn unexpected_token_after_end_of_statement() {
    assert_eq!(err("stop extra"), ErrorKind::UnexpectedTok);
}

#[test]
fn truncated_statement_missing_final_operand_is_unexpected_eol() {
    assert_eq!(err("add $1, $2"), ErrorKind::UnexpectedEol);
}

#[test]
fn db_value_out_of_signed_byte_range_is_rejected() {
    assert_eq!(err(".db 128"), ErrorKind::InvalImmed);
    assert!(matches!(ok(".db 127"), StatementKind::Directive(_)));
    assert!(matches!(ok(".db -128"), StatementKind::Directive(_)));
}

#[test]
fn lb_immediate_bound_is_one_byte() {
    assert_eq!(err("lb $1, 128, $2"), ErrorKind::InvalImmed);
    assert!(matches!(ok("lb $1, 127, $2"), StatementKind::Operation(_)));
}

#[test]
fn lw_immediate_still_uses_sixteen_bit_bound() {
    assert!(matches!(ok("lw $1, 32767, $2"), StatementKind::Operation(_)));
    assert_eq!(err("lw $1, 32768, $2"), ErrorKind::InvalImmed);
}
