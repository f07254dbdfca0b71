use clap::Parser;
use std::cell::RefCell;
use std::io::Read;
use std::rc::Rc;

use quill::interpreter::{Code, Interp};
use quill::{HostCommand, Tcl, TclOptions, Value};

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "A TCL-dialect scripting engine")]
#[command(version)]
struct Cli {
    /// Execute the script from command line argument
    #[arg(short = 'c')]
    script: Option<String>,

    /// Output results as JSON (result, output, code)
    #[arg(long = "json")]
    json: bool,

    /// Script file to execute
    #[arg()]
    script_file: Option<String>,
}

/// `puts` lives on the embedder side of the command seam: it appends to
/// a captured output buffer that main prints when the script finishes.
struct PutsCommand {
    out: Rc<RefCell<String>>,
}

impl HostCommand for PutsCommand {
    fn invoke(&self, interp: &mut Interp, argv: &[Value]) -> Code {
        let (text, newline) = match argv.len() {
            2 => (argv[1].as_str(), true),
            3 if argv[1].as_str() == "-nonewline" => (argv[2].as_str(), false),
            _ => return interp.wrong_num_args("puts ?-nonewline? string"),
        };
        let mut out = self.out.borrow_mut();
        out.push_str(&text);
        if newline {
            out.push('\n');
        }
        interp.ok(Value::empty())
    }
}

fn main() {
    let cli = Cli::parse();

    // Determine script source: -c, file, or stdin
    let script = if let Some(s) = cli.script {
        s
    } else if let Some(ref file) = cli.script_file {
        match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error: Cannot read script file: {}: {}", file, e);
                std::process::exit(1);
            }
        }
    } else {
        use std::io::IsTerminal;
        if std::io::stdin().is_terminal() {
            eprintln!("Error: No script provided. Use -c 'script', provide a script file, or pipe via stdin.");
            std::process::exit(1);
        }
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).unwrap_or_default();
        buf
    };

    let output = Rc::new(RefCell::new(String::new()));
    let mut tcl = Tcl::new(TclOptions::default());
    tcl.register_command(
        "::puts",
        Rc::new(PutsCommand {
            out: output.clone(),
        }),
    );

    let outcome = tcl.eval(&script);
    let captured = output.borrow().clone();

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "result": outcome.result,
                "output": captured,
                "code": outcome.code,
                "options": outcome.options,
            })
        );
        std::process::exit(if outcome.code == 0 { 0 } else { 1 });
    }

    print!("{}", captured);
    if outcome.code != 0 {
        eprintln!("{}", outcome.result);
        if let Some(info) = tcl.get_var("::errorInfo") {
            if !info.is_empty() && info != outcome.result {
                eprintln!("{}", info);
            }
        }
        std::process::exit(1);
    }
    if !outcome.result.is_empty() {
        println!("{}", outcome.result);
    }
}
