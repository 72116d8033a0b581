// SPDX-License-Identifier: BSD-3-Clause

//! A minimal, dependency-free string-lookup table standing in for a real localization resource
//! pack. The rest of the crate treats this as an opaque `localize(path) -> String` function;
//! internationalization proper (resource loading, language switching) is out of scope.

use std::collections::HashMap;

const LANGUAGE: &str = "en";

/// One node of the nested resource table: either a leaf message, or another level of keys.
enum Node {
    Leaf(&'static str),
    Branch(HashMap<&'static str, Node>),
}

fn branch(entries: Vec<(&'static str, Node)>) -> Node {
    Node::Branch(entries.into_iter().collect())
}

fn leaf(message: &'static str) -> Node {
    Node::Leaf(message)
}

fn resources() -> Node {
    branch(vec![(
        LANGUAGE,
        branch(vec![(
            "salto",
            branch(vec![(
                "errors",
                branch(vec![
                    ("ES", leaf("Syntax error. The received message from the PMS is not correct (unknown command, nonsense parameters, prohibited characters, etc.)")),
                    ("NC", leaf("No communication. The specified encoder does not answer (encoder is switched off, disconnected from the PC interface, etc.)")),
                    ("NF", leaf("No files. Database file in the PC interface is damaged, corrupted or not found.")),
                    ("OV", leaf("Overflow. The encoder is still busy executing a previous task and cannot accept a new one.")),
                    ("EP", leaf("Card error. Card not found or wrongly inserted in the encoder.")),
                    ("EF", leaf("Format error. The card has been encoded by another system or may be damaged.")),
                    ("TD", leaf("Unknown room. This error occurs when trying to encode a card for a non-existing room.")),
                    ("ED", leaf("Timeout error. The encoder has been waiting too long for a card to be inserted. The operation is cancelled.")),
                    ("EA", leaf("This error occurs when the PC interface cannot execute the 'CC' command (encode copies of a guest card) because the room is checked out.")),
                    ("OS", leaf("This error occurs when the requested room is out of service.")),
                    ("EO", leaf("The requested guest card is being encoded by another station.")),
                    ("EV", leaf("Card validity error. This error occurs when the inserted card for a 'CN', 'CC' or 'CA' command belongs to a valid staff user.")),
                    ("EG", leaf("General error")),
                ]),
            )]),
        )]),
    )])
}

/// Looks up `path` (a dot-separated key, e.g. `"salto.errors.ES"`) in the resource table and
/// returns its message, or `path` unchanged if any segment of the walk misses.
pub fn localize(path: &str) -> String {
    let root = resources();
    let mut current = &root;

    for part in std::iter::once(LANGUAGE).chain(path.split('.')) {
        match current {
            Node::Branch(map) => match map.get(part) {
                Some(next) => current = next,
                None => return path.to_string(),
            },
            Node::Leaf(_) => return path.to_string(),
        }
    }

    match current {
        Node::Leaf(message) => message.to_string(),
        Node::Branch(_) => path.to_string(),
    }
}
