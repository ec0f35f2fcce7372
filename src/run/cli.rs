use anyhow::Result;

pub(crate) fn as_cli(args: &[String]) -> Result<()> {
    match args[1].as_str() {
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("mibilletera {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown argument: {other}");
        }
    }
}

fn print_usage() {
    println!("mibilletera: records yesterday's card charges in the expenses spreadsheet");
    println!();
    println!("Usage: mibilletera");
    println!();
    println!("Meant to be run once a day by a scheduler. Settings come from the");
    println!("environment (or a .env file):");
    println!("  MIBILLETERA_SHEET_URL         Spreadsheet URL (required)");
    println!("  MIBILLETERA_SERVICE_ACCOUNT   Service account key file (required)");
    println!("  MIBILLETERA_SENDER            Notification sender address");
    println!("  MIBILLETERA_SUBJECT           Subject of charge notifications");
    println!("  MIBILLETERA_SHOPS_SHEET       Shops worksheet (default: tiendas)");
    println!("  MIBILLETERA_EXPENSES_SHEET    Expenses worksheet (default: gastos)");
    println!("  MIBILLETERA_DEFAULT_CATEGORY  Category for unknown shops (default: otros)");
    println!("  MIBILLETERA_UTC_OFFSET        Timezone for \"yesterday\" (default: -04:00)");
    println!("  MIBILLETERA_CLIENT_SECRETS    OAuth client file (default: credentials.json)");
    println!("  MIBILLETERA_TOKEN_CACHE       Where the Gmail token is kept");
    println!("  MIBILLETERA_OAUTH_PORT        Port for the authorization redirect (default: 8080)");
    println!("  MIBILLETERA_LEDGER_CSV        Append to this CSV file instead of the spreadsheet");
    println!();
    println!("Options:");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
}
