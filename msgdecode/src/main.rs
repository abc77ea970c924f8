use std::borrow::Cow;
use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};

use env_logger;
use msgdecode::{decode_message_with, DecodeOptions, Message, PropertySet, StorageNode};
use msox::PropValue;


fn hexdump(bytes: &[u8], prefix: &str) {
    let mut i = 0;

    while i < bytes.len() {
        print!("{}{:08x}", prefix, i);
        for j in 0..16 {
            if i + j < bytes.len() {
                print!(" {:02x}", bytes[i + j]);
            } else {
                print!("   ");
            }
            if j == 7 {
                print!(" ");
            }
        }
        print!(" |");
        for &b in bytes.iter().skip(i).take(16) {
            if (0x20..=0x7E).contains(&b) {
                print!("{}", char::from(b));
            } else {
                print!(".");
            }
        }
        println!("|");

        i += 16;
    }
}


fn output_properties(properties: &PropertySet, indent: &str, hex: bool) {
    for property in properties.iter() {
        match &property.value {
            PropValue::Binary(bs)|PropValue::Object(bs) if hex => {
                println!("{}{}: {} bytes", indent, property, bs.len());
                hexdump(bs, &format!("{}    ", indent));
            },
            PropValue::Binary(bs)|PropValue::Object(bs) => {
                println!("{}{}: {} bytes", indent, property, bs.len());
            },
            other => {
                println!("{}{}: {:?}", indent, property, other);
            },
        }
    }
    for fault in properties.faults() {
        println!("{}! {}: {}", indent, fault.tag, fault.error);
    }
}

fn output_message(message: &Message, indent: &str, hex: bool) {
    println!("{}kind: {:?}", indent, message.kind());
    output_properties(&message.properties, indent, hex);

    let nested_indent = format!("{}    ", indent);
    for (i, recipient) in message.recipients.iter().enumerate() {
        println!("{}Recipient {} ({:?}):", indent, i, recipient.recipient_type());
        output_properties(&recipient.properties, &nested_indent, hex);
    }
    for (i, attachment) in message.attachments.iter().enumerate() {
        println!("{}Attachment {} ({:?}):", indent, i, attachment.method());
        output_properties(&attachment.properties, &nested_indent, hex);
        if let Some(embedded) = attachment.embedded_message() {
            println!("{}Embedded message:", nested_indent);
            output_message(embedded, &format!("{}    ", nested_indent), hex);
        }
    }
    for fault in &message.faults {
        println!("{}! {}: {}", indent, fault.storage, fault.error);
    }
}


fn usage(arg0: &str) {
    eprintln!("Usage: {} [--codepage CODEPAGE] [--max-depth DEPTH] [--hexdump] MESSAGE", arg0);
}

fn run() -> i32 {
    let args: Vec<OsString> = env::args_os().collect();
    let arg0 = args
        .get(0)
        .map(|a| a.to_string_lossy())
        .unwrap_or(Cow::Borrowed("msgdecode"))
        .into_owned();

    let mut options = DecodeOptions::default();
    let mut hex = false;
    let mut path = None;
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.to_str() {
            Some("--codepage") => {
                match rest.next().and_then(|v| v.to_str()).and_then(|v| v.parse().ok()) {
                    Some(codepage) => options = options.with_fallback_codepage(codepage),
                    None => {
                        usage(&arg0);
                        return 1;
                    },
                }
            },
            Some("--max-depth") => {
                match rest.next().and_then(|v| v.to_str()).and_then(|v| v.parse().ok()) {
                    Some(depth) => options = options.with_max_embedding_depth(depth),
                    None => {
                        usage(&arg0);
                        return 1;
                    },
                }
            },
            Some("--hexdump") => hex = true,
            _ if path.is_none() => path = Some(arg.clone()),
            _ => {
                usage(&arg0);
                return 1;
            },
        }
    }
    let Some(path) = path else {
        usage(&arg0);
        return 1;
    };

    env_logger::init();

    let mut buf = Vec::new();
    {
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("failed to open {}: {}", path.to_string_lossy(), e);
                return 1;
            },
        };
        if let Err(e) = BufReader::new(file).read_to_end(&mut buf) {
            eprintln!("failed to read {}: {}", path.to_string_lossy(), e);
            return 1;
        }
    }

    let mut compound = match cfb::CompoundFile::open(Cursor::new(buf)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} is not a compound file: {}", path.to_string_lossy(), e);
            return 1;
        },
    };
    let root = match StorageNode::materialize(&mut compound) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("failed to read compound file: {}", e);
            return 1;
        },
    };

    let message = match decode_message_with(&root, &options) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("failed to decode message: {}", e);
            return 1;
        },
    };
    output_message(&message, "", hex);

    0
}


fn main() {
    std::process::exit(run());
}
