use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{CommandFactory, Parser as ClapParser, ValueEnum, error::ErrorKind};
use cmmc::{
    backend::{
        CodegenOptions,
        pretty_print::pretty_print_class,
        targets::{CodeGenerator, Target},
    },
    error::CompileError,
    frontend::{SourceFile, SourceFileOrigin},
    lower_source,
};
use colored::Colorize;

macro_rules! function {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        type_name_of(f)
            .rsplit("::")
            .find(|&part| part != "f" && part != "{{closure}}")
            .unwrap_or("main")
    }};
}

macro_rules! report_error {
    ($location:expr, $message:expr $(,)?) => {{
        let message = format!("{}: {}", "error".red(), $message);

        #[cfg(feature = "error-backtrace")]
        let message = format!(
            "{}: {}\n{}",
            "backtrace".blue(),
            format!(
                "{}::{} {}",
                module_path!(),
                function!(),
                format!("(at {}:{}:{})", file!(), line!(), column!()).white()
            ),
            message
        );

        match $location {
            Some(location) => eprintln!("{} {}", message, format!("(at {location})").white()),
            None => eprintln!("{message}"),
        }
    }};
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Print the lowered instructions of every function
    Ir,
    /// Write the Jasmin assembly next to the output
    Asm,
    /// Write the Jasmin assembly and assemble it into class files
    Class,
}

#[derive(Debug, ClapParser)]
#[command(version, about, long_about = None)]
pub struct Args {
    source_files: Vec<PathBuf>,

    /// Directory for `.j` and `.class` files, defaults to the directory of
    /// each source file
    #[arg(short, long)]
    output_directory: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Emit::Class)]
    emit: Emit,

    /// Path to the Jasmin assembler
    #[arg(long, default_value = "jasmin.jar")]
    assembler_jar: PathBuf,

    /// Function called by the generated JVM `main`
    #[arg(long, default_value = "main")]
    entry_point: String,

    /// Class providing `printInt` and `readInt`
    #[arg(long, default_value = "Runtime")]
    runtime_class: String,

    /// Comment every emitted instruction with its IR
    #[arg(long)]
    annotate: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn status(verbose: bool, action: &str, subject: impl std::fmt::Display) {
    if verbose {
        eprintln!("{:>12} {subject}", action.green().bold());
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.source_files.is_empty() {
        Args::command()
            .error(ErrorKind::MissingRequiredArgument, "Missing source files!")
            .exit();
    }

    for source_file in &args.source_files {
        if !source_file.exists() {
            Args::command()
                .error(
                    ErrorKind::InvalidValue,
                    format!("Source file '{}' does not exist!", source_file.display()),
                )
                .exit()
        }

        if !source_file.is_file() {
            Args::command()
                .error(
                    ErrorKind::InvalidValue,
                    format!("Input path '{}' is not a file!", source_file.display()),
                )
                .exit()
        }
    }

    let options = CodegenOptions {
        entry_point: args.entry_point.clone(),
        runtime_class: args.runtime_class.clone(),
        assembler_jar: args.assembler_jar.clone(),
        annotate: args.annotate,
    };

    let mut failed = false;

    for path in &args.source_files {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) => {
                report_error!(
                    None::<String>,
                    format!("Failed to read '{}': {error}", path.display())
                );
                failed = true;
                continue;
            }
        };

        let source = SourceFile {
            contents,
            origin: SourceFileOrigin::File(path.clone()),
        };

        if let Err(message) = compile_file(&args, &options, &source) {
            failed = true;
            if let Some(message) = message {
                report_error!(None::<String>, message);
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Compiles one file. Compile errors are reported here, other failures are
/// handed back for the caller to report.
fn compile_file(
    args: &Args,
    options: &CodegenOptions,
    source: &SourceFile,
) -> Result<(), Option<String>> {
    status(args.verbose, "Lowering", &source.origin);

    let unit = match lower_source(source, options) {
        Ok(unit) => unit,
        Err(error) => {
            report_compile_error(source, &error);
            return Err(None);
        }
    };

    if args.emit == Emit::Ir {
        pretty_print_class(&unit);
        return Ok(());
    }

    let code_generator = Target::Jasmin.get_code_generator();
    let asm = code_generator.translate_to_asm(&unit, options);

    let SourceFileOrigin::File(path) = &source.origin else {
        print!("{asm}");
        return Ok(());
    };

    let output_directory = args
        .output_directory
        .clone()
        .or_else(|| path.parent().map(Path::to_path_buf))
        .unwrap_or_default();

    if !output_directory.as_os_str().is_empty() {
        std::fs::create_dir_all(&output_directory).map_err(|error| {
            Some(format!(
                "Failed to create '{}': {error}",
                output_directory.display()
            ))
        })?;
    }

    let asm_file = output_directory
        .join(&unit.class_name)
        .with_extension(code_generator.asm_extension());

    status(args.verbose, "Writing", asm_file.display());

    std::fs::write(&asm_file, asm)
        .map_err(|error| Some(format!("Failed to write '{}': {error}", asm_file.display())))?;

    if args.emit == Emit::Asm {
        return Ok(());
    }

    status(args.verbose, "Assembling", asm_file.display());

    let class_directory = if output_directory.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        output_directory
    };

    let exit_status = code_generator
        .create_assembler_command(&asm_file, &class_directory, options)
        .status()
        .map_err(|error| Some(format!("Failed to run the assembler: {error}")))?;

    if !exit_status.success() {
        return Err(Some(format!(
            "Assembling '{}' failed ({exit_status})",
            asm_file.display()
        )));
    }

    Ok(())
}

fn report_compile_error(source: &SourceFile, error: &CompileError) {
    report_error!(error.location(source), error);

    if let Some(span) = error.span() {
        eprintln!("{}", source.highlight_span(span));
    }

    if matches!(error, CompileError::Lowering(error) if error.is_internal()) {
        eprintln!(
            "{}: this is a bug in the compiler, the program itself may be fine",
            "note".bold()
        );
    }
}
