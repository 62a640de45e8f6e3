//! Whole-program scenarios through translator and runtime.

#[cfg(test)]
mod tests {
    use crate::test_helpers::{run_source, run_source_ok};
    use sandbox_runtime::{TrapError, EOF_SENTINEL};

    #[test]
    fn test_echo_three_bytes() {
        assert_eq!(run_source_ok(",.,.,.", b"abc"), vec![97, 98, 99]);
    }

    #[test]
    fn test_single_read_on_empty_input_is_sentinel() {
        assert_eq!(run_source_ok(",.", b""), vec![EOF_SENTINEL]);
    }

    #[test]
    fn test_cat_copies_input_until_sentinel() {
        assert_eq!(run_source_ok(",+[-.,+]", b"bridge"), b"bridge".to_vec());
        assert_eq!(run_source_ok(",+[-.,+]", b""), Vec::<u8>::new());
    }

    #[test]
    fn test_hello_world() {
        let program = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]\
                       >>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";
        assert_eq!(run_source_ok(program, b""), b"Hello World!\n".to_vec());
    }

    #[test]
    fn test_clear_loop_zeroes_any_cell_value() {
        // the peephole pass turns [-] into a store; behavior must not change
        assert_eq!(run_source_ok("+++++[-].", b""), vec![0]);
        assert_eq!(run_source_ok(",[-].", b"\xfe"), vec![0]);
    }

    #[test]
    fn test_wrapping_decrement_of_sentinel_hits_zero() {
        // reading EOF (255) then adding one wraps to zero; the canonical
        // until-sentinel loop depends on it
        assert_eq!(run_source_ok(",+.", b""), vec![0]);
    }

    #[test]
    fn test_comments_do_not_change_behavior() {
        let bare = run_source_ok(",.", b"q");
        let commented = run_source_ok("read one byte, then echo it back.", b"q");
        assert_eq!(bare, commented);
    }

    #[test]
    fn test_pointer_underflow_traps_mid_program() {
        let (output, result) = run_source(".<.", b"");
        assert_eq!(output, vec![0]);
        assert_eq!(result, Err(TrapError::PointerUnderflow(-1)));
    }

    #[test]
    fn test_nested_loop_multiplication() {
        // 3 * 4 into the next cell: +++[>++++<-]>.
        assert_eq!(run_source_ok("+++[>++++<-]>.", b""), vec![12]);
    }
}
