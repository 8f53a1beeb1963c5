use winpostmortem::catalog::ReportKind;

fn main() { winpostmortem::cli::main_for(ReportKind::CrashHang); }
