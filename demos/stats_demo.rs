use clap::Parser;
use probe_hash::HashTable;

#[derive(Parser, Debug)]
struct Args {
    /// Number of distinct keys to insert.
    #[arg(short = 'n', long = "entries", default_value_t = 1000)]
    entries: usize,

    /// Remove every Nth inserted key afterwards (0 disables removal).
    #[arg(short = 'r', long = "remove-every", default_value_t = 0)]
    remove_every: usize,

    /// Initial slot count.
    #[arg(short = 'c', long = "initial-capacity", default_value_t = 8)]
    initial_capacity: usize,
}

fn main() {
    let args = Args::parse();

    println!(
        "Creating HashTable with initial capacity: {}",
        args.initial_capacity
    );
    let mut table: HashTable<usize> = HashTable::with_capacity(args.initial_capacity);
    println!("Actual capacity: {}", table.capacity());

    let mut resizes = 0;
    for i in 0..args.entries {
        let before = table.capacity();
        table.set(format!("key_{i}"), i);
        if table.capacity() != before {
            resizes += 1;
        }
    }
    println!(
        "Inserted {} keys ({} resizes), capacity now {}",
        table.len(),
        resizes,
        table.capacity()
    );

    if args.remove_every > 0 {
        let mut removed = 0;
        for i in (0..args.entries).step_by(args.remove_every) {
            if table.remove(&format!("key_{i}")).is_ok() {
                removed += 1;
            }
        }
        println!(
            "Removed {} keys, leaving {} tombstones",
            removed,
            table.tombstones()
        );
    }

    println!("Final load ratio: {:.2}%", table.load_ratio() * 100.0);
    table.print_probe_histogram();
    table.debug_stats().print();
}
