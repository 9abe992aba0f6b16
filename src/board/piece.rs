//! Piece classes, their template file names and FEN symbols.

use std::fmt;

/// Side owning a piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Red,
    Black,
}

/// One of the 14 recognizable piece classes.
///
/// Variant order is the board-filling order: red rook, horse, cannon,
/// advisor, elephant, pawn, king, then the black classes in the same order.
/// Later classes overwrite earlier ones when two points share a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceKind {
    RedRook,
    RedHorse,
    RedCannon,
    RedAdvisor,
    RedElephant,
    RedPawn,
    RedKing,
    BlackRook,
    BlackHorse,
    BlackCannon,
    BlackAdvisor,
    BlackElephant,
    BlackPawn,
    BlackKing,
}

impl PieceKind {
    /// Every class in board-filling order.
    pub const ALL: [PieceKind; 14] = [
        PieceKind::RedRook,
        PieceKind::RedHorse,
        PieceKind::RedCannon,
        PieceKind::RedAdvisor,
        PieceKind::RedElephant,
        PieceKind::RedPawn,
        PieceKind::RedKing,
        PieceKind::BlackRook,
        PieceKind::BlackHorse,
        PieceKind::BlackCannon,
        PieceKind::BlackAdvisor,
        PieceKind::BlackElephant,
        PieceKind::BlackPawn,
        PieceKind::BlackKing,
    ];

    /// Order in which a scan searches the classes; the black king comes
    /// first because it is the mandatory anchor.
    pub const SCAN_ORDER: [PieceKind; 14] = [
        PieceKind::BlackKing,
        PieceKind::BlackRook,
        PieceKind::BlackHorse,
        PieceKind::BlackCannon,
        PieceKind::BlackAdvisor,
        PieceKind::BlackElephant,
        PieceKind::BlackPawn,
        PieceKind::RedRook,
        PieceKind::RedHorse,
        PieceKind::RedCannon,
        PieceKind::RedAdvisor,
        PieceKind::RedElephant,
        PieceKind::RedPawn,
        PieceKind::RedKing,
    ];

    /// Position of this class in [`PieceKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn side(self) -> Side {
        if self.index() < 7 {
            Side::Red
        } else {
            Side::Black
        }
    }

    /// Template file stem inside a catalog directory.
    pub fn file_stem(self) -> &'static str {
        match self {
            PieceKind::RedRook => "rr",
            PieceKind::RedHorse => "rn",
            PieceKind::RedCannon => "rc",
            PieceKind::RedAdvisor => "ra",
            PieceKind::RedElephant => "rb",
            PieceKind::RedPawn => "rp",
            PieceKind::RedKing => "rk",
            PieceKind::BlackRook => "br",
            PieceKind::BlackHorse => "bn",
            PieceKind::BlackCannon => "bc",
            PieceKind::BlackAdvisor => "ba",
            PieceKind::BlackElephant => "bb",
            PieceKind::BlackPawn => "bp",
            PieceKind::BlackKing => "bk",
        }
    }

    /// Template file name inside a catalog directory.
    pub fn file_name(self) -> String {
        format!("{}.png", self.file_stem())
    }

    /// FEN symbol: uppercase for red, lowercase for black.
    pub fn fen_char(self) -> char {
        let lower = match self {
            PieceKind::RedRook | PieceKind::BlackRook => 'r',
            PieceKind::RedHorse | PieceKind::BlackHorse => 'n',
            PieceKind::RedCannon | PieceKind::BlackCannon => 'c',
            PieceKind::RedAdvisor | PieceKind::BlackAdvisor => 'a',
            PieceKind::RedElephant | PieceKind::BlackElephant => 'b',
            PieceKind::RedPawn | PieceKind::BlackPawn => 'p',
            PieceKind::RedKing | PieceKind::BlackKing => 'k',
        };
        match self.side() {
            Side::Red => lower.to_ascii_uppercase(),
            Side::Black => lower,
        }
    }

    /// Parses a FEN symbol back to its class.
    pub fn from_fen_char(c: char) -> Option<PieceKind> {
        PieceKind::ALL.into_iter().find(|kind| kind.fen_char() == c)
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

#[cfg(test)]
mod tests {
    use super::{PieceKind, Side};
    use std::collections::HashSet;

    #[test]
    fn symbols_and_files_are_unique() {
        let chars: HashSet<char> = PieceKind::ALL.iter().map(|k| k.fen_char()).collect();
        let files: HashSet<&str> = PieceKind::ALL.iter().map(|k| k.file_stem()).collect();
        assert_eq!(chars.len(), 14);
        assert_eq!(files.len(), 14);
    }

    #[test]
    fn scan_order_covers_every_class() {
        let mut order = PieceKind::SCAN_ORDER;
        order.sort();
        assert_eq!(order, PieceKind::ALL);
        assert_eq!(PieceKind::SCAN_ORDER[0], PieceKind::BlackKing);
    }

    #[test]
    fn case_follows_side() {
        assert_eq!(PieceKind::RedElephant.fen_char(), 'B');
        assert_eq!(PieceKind::BlackHorse.fen_char(), 'n');
        assert_eq!(PieceKind::BlackKing.side(), Side::Black);
        assert_eq!(PieceKind::from_fen_char('C'), Some(PieceKind::RedCannon));
        assert_eq!(PieceKind::from_fen_char('x'), None);
    }
}
