use std::process::ExitCode;

fn main() -> ExitCode {
    ffi_pointer::run_cli()
}
