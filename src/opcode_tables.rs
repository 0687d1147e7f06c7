//! Per-variant opcode tables for both bytecode machines
//!
//! Script opcodes are dense small integers assigned by the original authoring
//! tools, so each game gets a flat table indexed by opcode number. Gaps in a
//! table are real: executing an unset index is a content bug and fatal.
//!
//! Argument signatures are strings of one letter per argument:
//! - `B` byte, or `0xFF` followed by a variable index
//! - `F` variable index (same encoding as `B`)
//! - `W` word; values 30000..30512 read a variable instead
//! - `I` item reference word
//! - `T` string id word
//! - `N` plain word
//! - `S` subroutine id word
//!
//! In Elvira 1 every argument is a word.

use crate::config::GameVariant;
use lazy_static::lazy_static;

/// Marks the argument of the comment opcode that the loader drops
pub const COMMENT_OPCODE: u16 = 87;

/// Which handler module runs an opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpGroup {
    Object,
    Math,
    Flow,
    Display,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptOp {
    // item conditions
    At,
    NotAt,
    Carried,
    NotCarried,
    IsAt,
    IsRoom,
    IsObject,
    State,
    OFlag,
    CanPut,
    IsClass,
    Here,
    // item effects
    Destroy,
    Place,
    Goto,
    OSet,
    OClear,
    PutBy,
    SetState,
    SetClass,
    UnsetClass,
    GetParent,
    GetNext,
    GetChildren,
    StoreItem,
    GetItem,
    // variables and arithmetic
    Zero,
    NotZero,
    Eq,
    NotEq,
    Gt,
    Lt,
    EqF,
    NotEqF,
    LtF,
    GtF,
    Chance,
    CopyFF,
    Clear,
    Let,
    Add,
    Sub,
    AddF,
    SubF,
    Mul,
    Div,
    MulF,
    DivF,
    Mod,
    ModF,
    Random,
    Inc,
    Dec,
    BitClear,
    BitSet,
    BitTest,
    // control flow
    End,
    Done,
    Process,
    When,
    Rescan,
    Comment,
    ClearTimers,
    WaitSync,
    Sync,
    Save,
    Load,
    PauseGame,
    // display, animation and sound
    Print,
    Message,
    Msg,
    HaltAnimation,
    RestartAnimation,
    Picture,
    LoadZone,
    Animate,
    Animate2,
    StopAnimate,
    StopAnimate2,
    KillAnimate,
    DefWindow,
    Window,
    Cls,
    CloseWindow,
    AddBox,
    DelBox,
    EnableBox,
    DisableBox,
    MoveBox,
    IsBox,
    FreezeZones,
    LockZones,
    UnlockZones,
    MouseOn,
    MouseOff,
    PlayTune,
    IfEndTune,
    StopTune,
    Speech,
    PlayEffect,
    PlayAmbient,
    WaitEndSpeech,
}

impl ScriptOp {
    pub fn name(&self) -> &'static str {
        use ScriptOp::*;
        match self {
            At => "at",
            NotAt => "notAt",
            Carried => "carried",
            NotCarried => "notCarried",
            IsAt => "isAt",
            IsRoom => "isRoom",
            IsObject => "isObject",
            State => "state",
            OFlag => "oflag",
            CanPut => "canPut",
            IsClass => "isClass",
            Here => "here",
            Destroy => "destroy",
            Place => "place",
            Goto => "goto",
            OSet => "oset",
            OClear => "oclear",
            PutBy => "putBy",
            SetState => "setState",
            SetClass => "setClass",
            UnsetClass => "unsetClass",
            GetParent => "getParent",
            GetNext => "getNext",
            GetChildren => "getChildren",
            StoreItem => "storeItem",
            GetItem => "getItem",
            Zero => "zero",
            NotZero => "notZero",
            Eq => "eq",
            NotEq => "notEq",
            Gt => "gt",
            Lt => "lt",
            EqF => "eqf",
            NotEqF => "notEqf",
            LtF => "ltf",
            GtF => "gtf",
            Chance => "chance",
            CopyFF => "copyff",
            Clear => "clear",
            Let => "let",
            Add => "add",
            Sub => "sub",
            AddF => "addf",
            SubF => "subf",
            Mul => "mul",
            Div => "div",
            MulF => "mulf",
            DivF => "divf",
            Mod => "mod",
            ModF => "modf",
            Random => "random",
            Inc => "inc",
            Dec => "dec",
            BitClear => "bitClear",
            BitSet => "bitSet",
            BitTest => "bitTest",
            End => "end",
            Done => "done",
            Process => "process",
            When => "when",
            Rescan => "rescan",
            Comment => "comment",
            ClearTimers => "clearTimers",
            WaitSync => "waitSync",
            Sync => "sync",
            Save => "save",
            Load => "load",
            PauseGame => "pauseGame",
            Print => "print",
            Message => "message",
            Msg => "msg",
            HaltAnimation => "haltAnimation",
            RestartAnimation => "restartAnimation",
            Picture => "picture",
            LoadZone => "loadZone",
            Animate => "animate",
            Animate2 => "animate",
            StopAnimate => "stopAnimate",
            StopAnimate2 => "stopAnimate",
            KillAnimate => "killAnimate",
            DefWindow => "defWindow",
            Window => "window",
            Cls => "cls",
            CloseWindow => "closeWindow",
            AddBox => "addBox",
            DelBox => "delBox",
            EnableBox => "enableBox",
            DisableBox => "disableBox",
            MoveBox => "moveBox",
            IsBox => "isBox",
            FreezeZones => "freezeZones",
            LockZones => "lockZones",
            UnlockZones => "unlockZones",
            MouseOn => "mouseOn",
            MouseOff => "mouseOff",
            PlayTune => "playTune",
            IfEndTune => "ifEndTune",
            StopTune => "stopTune",
            Speech => "speech",
            PlayEffect => "playEffect",
            PlayAmbient => "playAmbient",
            WaitEndSpeech => "waitEndSpeech",
        }
    }

    /// Argument signature, one letter per argument
    pub fn args(&self) -> &'static str {
        use ScriptOp::*;
        match self {
            At | NotAt | Carried | NotCarried | IsRoom | IsObject | Destroy | Goto | Here => "I",
            IsAt | Place | PutBy => "II",
            State | SetState => "IW",
            OFlag | OSet | OClear | IsClass | SetClass | UnsetClass => "IB",
            GetParent | GetNext | GetChildren => "IB",
            CanPut => "IIF",
            StoreItem => "BI",
            GetItem => "BB",
            Zero | NotZero | Clear | Inc | Dec | Print => "F",
            Eq | NotEq | Gt | Lt | Let | Add | Sub | Mul | Div | Mod | Random => "FW",
            EqF | NotEqF | LtF | GtF | CopyFF | AddF | SubF | MulF | DivF | ModF => "FF",
            Chance => "W",
            BitClear | BitSet | BitTest => "B",
            End | Done | Rescan | ClearTimers | Save | Load | PauseGame => "",
            Process => "W",
            When => "WW",
            Comment => "N",
            WaitSync | Sync => "W",
            Message | Msg => "T",
            HaltAnimation | RestartAnimation | KillAnimate | Cls => "",
            Picture => "WB",
            LoadZone => "W",
            Animate => "BWWWW",
            Animate2 => "BWWWWW",
            StopAnimate => "W",
            StopAnimate2 => "WW",
            DefWindow => "BBBBBBB",
            Window | CloseWindow => "B",
            AddBox => "WWWWWIW",
            DelBox | EnableBox | DisableBox | IsBox => "W",
            MoveBox => "WWW",
            FreezeZones | LockZones | UnlockZones | MouseOn | MouseOff => "",
            PlayTune => "WW",
            IfEndTune | StopTune | WaitEndSpeech => "",
            Speech | PlayEffect | PlayAmbient => "W",
        }
    }

    pub fn group(&self) -> OpGroup {
        use ScriptOp::*;
        match self {
            At | NotAt | Carried | NotCarried | IsAt | IsRoom | IsObject | State | OFlag
            | CanPut | IsClass | Here | Destroy | Place | Goto | OSet | OClear | PutBy
            | SetState | SetClass | UnsetClass | GetParent | GetNext | GetChildren
            | StoreItem | GetItem => OpGroup::Object,
            Zero | NotZero | Eq | NotEq | Gt | Lt | EqF | NotEqF | LtF | GtF | Chance
            | CopyFF | Clear | Let | Add | Sub | AddF | SubF | Mul | Div | MulF | DivF | Mod
            | ModF | Random | Inc | Dec | BitClear | BitSet | BitTest => OpGroup::Math,
            End | Done | Process | When | Rescan | Comment | ClearTimers | WaitSync | Sync
            | Save | Load | PauseGame => OpGroup::Flow,
            _ => OpGroup::Display,
        }
    }

    /// Condition opcodes only set the script condition
    pub fn is_condition(&self) -> bool {
        use ScriptOp::*;
        matches!(
            self,
            At | NotAt
                | Carried
                | NotCarried
                | IsAt
                | IsRoom
                | IsObject
                | State
                | OFlag
                | CanPut
                | IsClass
                | Here
                | Zero
                | NotZero
                | Eq
                | NotEq
                | Gt
                | Lt
                | EqF
                | NotEqF
                | LtF
                | GtF
                | Chance
                | BitTest
                | IsBox
                | IfEndTune
        )
    }
}

/// Dense opcode table of one game variant
#[derive(Debug, Clone)]
pub struct OpcodeTable {
    pub game: GameVariant,
    entries: Vec<Option<ScriptOp>>,
}

impl OpcodeTable {
    fn build(game: GameVariant, assignments: &[(u16, ScriptOp)]) -> OpcodeTable {
        let mut entries = vec![None; game.script_opcode_count()];
        for &(opcode, op) in assignments {
            entries[opcode as usize] = Some(op);
        }
        OpcodeTable { game, entries }
    }

    fn with(mut self, game: GameVariant, set: &[(u16, ScriptOp)], unset: &[u16]) -> OpcodeTable {
        self.game = game;
        for &(opcode, op) in set {
            self.entries[opcode as usize] = Some(op);
        }
        for &opcode in unset {
            self.entries[opcode as usize] = None;
        }
        self
    }

    pub fn for_game(game: GameVariant) -> &'static OpcodeTable {
        match game {
            GameVariant::Elvira1 => &ELVIRA1_TABLE,
            GameVariant::Elvira2 => &ELVIRA2_TABLE,
            GameVariant::Waxworks => &WAXWORKS_TABLE,
            GameVariant::Simon1 => &SIMON1_TABLE,
            GameVariant::Simon2 => &SIMON2_TABLE,
            GameVariant::Feeble => &FEEBLE_TABLE,
            GameVariant::PuzzlePack => &PUZZLEPACK_TABLE,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `None` both for indices past the end and for gaps
    pub fn entry(&self, opcode: u16) -> Option<ScriptOp> {
        self.entries.get(opcode as usize).copied().flatten()
    }

    pub fn signature(&self, opcode: u16) -> Option<&'static str> {
        if opcode == COMMENT_OPCODE && !self.game.word_opcodes() {
            return Some("N");
        }
        self.entry(opcode).map(|op| op.args())
    }

    pub fn opcode_of(&self, op: ScriptOp) -> Option<u16> {
        self.entries
            .iter()
            .position(|e| *e == Some(op))
            .map(|i| i as u16)
    }
}

use ScriptOp::*;

const CORE_OPCODES: &[(u16, ScriptOp)] = &[
    (1, At),
    (2, NotAt),
    (5, Carried),
    (6, NotCarried),
    (7, IsAt),
    (11, Zero),
    (12, NotZero),
    (13, Eq),
    (14, NotEq),
    (15, Gt),
    (16, Lt),
    (17, EqF),
    (18, NotEqF),
    (19, LtF),
    (20, GtF),
    (23, Chance),
    (25, IsRoom),
    (26, IsObject),
    (27, State),
    (28, OFlag),
    (31, Destroy),
    (33, Place),
    (35, CanPut),
    (36, CopyFF),
    (41, Clear),
    (42, Let),
    (43, Add),
    (44, Sub),
    (45, AddF),
    (46, SubF),
    (47, Mul),
    (48, Div),
    (49, MulF),
    (50, DivF),
    (51, Mod),
    (52, ModF),
    (53, Random),
    (55, Goto),
    (56, OSet),
    (57, OClear),
    (58, PutBy),
    (59, Inc),
    (60, Dec),
    (61, SetState),
    (62, Print),
    (63, Message),
    (64, Msg),
    (68, End),
    (69, Done),
    (71, Process),
    (76, When),
    (83, Rescan),
    (87, Comment),
    (88, HaltAnimation),
    (89, RestartAnimation),
    (90, GetParent),
    (91, GetNext),
    (92, GetChildren),
    (96, Picture),
    (97, LoadZone),
    (98, Animate),
    (99, StopAnimate),
    (100, KillAnimate),
    (101, DefWindow),
    (102, Window),
    (103, Cls),
    (104, CloseWindow),
    (115, IsClass),
    (116, SetClass),
    (117, UnsetClass),
    (119, WaitSync),
    (120, Sync),
    (125, Here),
    (132, Save),
    (133, Load),
    (135, PauseGame),
    (140, ClearTimers),
];

const BOX_OPCODES: &[(u16, ScriptOp)] = &[
    (107, AddBox),
    (108, DelBox),
    (109, EnableBox),
    (110, DisableBox),
    (111, MoveBox),
    (142, IsBox),
];

const SIMON_OPCODES: &[(u16, ScriptOp)] = &[
    (127, PlayTune),
    (129, IfEndTune),
    (134, StopTune),
    (138, FreezeZones),
    (151, StoreItem),
    (152, GetItem),
    (153, BitClear),
    (154, BitSet),
    (155, BitTest),
    (175, LockZones),
    (176, UnlockZones),
    (180, MouseOn),
    (181, MouseOff),
    (186, Speech),
    (187, PlayEffect),
    (189, PlayAmbient),
    (190, WaitEndSpeech),
];

const ELVIRA1_OPCODES: &[(u16, ScriptOp)] = &[
    (0, At),
    (1, NotAt),
    (6, Carried),
    (7, NotCarried),
    (8, IsAt),
    (12, Zero),
    (13, NotZero),
    (14, Eq),
    (15, NotEq),
    (16, Gt),
    (17, Lt),
    (18, EqF),
    (19, NotEqF),
    (20, LtF),
    (21, GtF),
    (29, Chance),
    (32, IsRoom),
    (33, IsObject),
    (34, State),
    (36, OFlag),
    (37, CanPut),
    (48, Destroy),
    (51, Place),
    (56, CopyFF),
    (61, Clear),
    (64, Let),
    (65, Add),
    (66, Sub),
    (67, AddF),
    (68, SubF),
    (69, Mul),
    (70, Div),
    (71, MulF),
    (72, DivF),
    (73, Mod),
    (74, ModF),
    (75, Random),
    (77, Goto),
    (80, OSet),
    (81, OClear),
    (84, PutBy),
    (85, Inc),
    (86, Dec),
    (87, SetState),
    (89, Print),
    (91, Message),
    (92, Msg),
    (97, End),
    (98, Done),
    (105, Process),
    (119, When),
    (163, Here),
    (165, PlayTune),
    (167, IfEndTune),
    (170, Save),
    (171, Load),
    (173, StopTune),
    (176, PauseGame),
    (181, FreezeZones),
    (183, ClearTimers),
    (185, IsBox),
    (206, GetParent),
    (207, GetNext),
    (208, GetChildren),
    (224, Picture),
    (225, LoadZone),
    (226, Animate),
    (227, StopAnimate),
    (228, KillAnimate),
    (229, DefWindow),
    (230, Window),
    (231, Cls),
    (232, CloseWindow),
    (235, AddBox),
    (236, DelBox),
    (237, EnableBox),
    (238, DisableBox),
    (239, MoveBox),
    (243, IsClass),
    (249, SetClass),
    (250, UnsetClass),
    (251, BitClear),
    (252, BitSet),
    (253, BitTest),
    (255, WaitSync),
    (256, Sync),
];

lazy_static! {
    static ref ELVIRA1_TABLE: OpcodeTable =
        OpcodeTable::build(GameVariant::Elvira1, ELVIRA1_OPCODES);
    static ref ELVIRA2_TABLE: OpcodeTable = OpcodeTable::build(GameVariant::Elvira2, CORE_OPCODES);
    static ref WAXWORKS_TABLE: OpcodeTable =
        ELVIRA2_TABLE
            .clone()
            .with(GameVariant::Waxworks, BOX_OPCODES, &[]);
    static ref SIMON1_TABLE: OpcodeTable =
        WAXWORKS_TABLE
            .clone()
            .with(GameVariant::Simon1, SIMON_OPCODES, &[]);
    static ref SIMON2_TABLE: OpcodeTable = SIMON1_TABLE.clone().with(
        GameVariant::Simon2,
        &[(98, Animate2), (99, StopAnimate2)],
        &[]
    );
    static ref FEEBLE_TABLE: OpcodeTable =
        SIMON2_TABLE
            .clone()
            .with(GameVariant::Feeble, &[], &[127, 129, 134]);
    static ref PUZZLEPACK_TABLE: OpcodeTable =
        FEEBLE_TABLE
            .clone()
            .with(GameVariant::PuzzlePack, &[], &[186, 190]);
}

// ---- VGA opcode tables ----

const VGA_OPCODE_NAMES: [&str; 85] = [
    "ret",
    "fadeOut",
    "call",
    "loadSprite",
    "fadeIn",
    "skipIfNeq",
    "skipIfNotSibWithA",
    "skipIfSibWithA",
    "skipIfParentIs",
    "skipIfStateIs",
    "draw",
    "clearPathFinder",
    "delay",
    "addToSpriteX",
    "addToSpriteY",
    "wakeupId",
    "sleepOnId",
    "setPathfinderItem",
    "jump",
    "chainToScript",
    "setRepeat",
    "endRepeat",
    "setSpritePalette",
    "setSpritePriority",
    "setSpriteXY",
    "haltSprite",
    "setSubWindow",
    "resetSprite",
    "dummy",
    "stopAllSounds",
    "setFrameRate",
    "setWindow",
    "copyVar",
    "setMouseOn",
    "setMouseOff",
    "clearWindow",
    "setWindowImage",
    "addToSpriteY",
    "skipIfVarZero",
    "setVar",
    "scrollRight",
    "scrollLeft",
    "delayIfNotEQ",
    "skipIfBitClear",
    "skipIfBitSet",
    "setSpriteX",
    "setSpriteY",
    "addToVar",
    "setPathFinder",
    "setBit",
    "clearBit",
    "clearHitAreaBit0x40",
    "playSound",
    "noop",
    "noop",
    "offsetHitArea",
    "delayLong",
    "noop",
    "swapSprite",
    "skipIfTextEnded",
    "killSprite",
    "setMaskImage",
    "fastFadeOut",
    "fastFadeIn",
    "skipIfSpeechEnded",
    "slowFadeIn",
    "skipIfNotEqual",
    "skipIfGE",
    "skipIfLE",
    "playTrack",
    "queueMusic",
    "checkMusicQueue",
    "playTrack2",
    "setMark",
    "clearMark",
    "setScale",
    "setScaleXOffs",
    "setScaleYOffs",
    "computeXY",
    "computePosNum",
    "setOverlayImage",
    "setRandom",
    "getPathValue",
    "playSoundLoop",
    "stopSoundLoop",
];

/// Operand bytes following each opcode, used to skip an instruction
const VGA_PARAMS_SIMON1: [u8; 64] = [
    0, 6, 2, 10, 6, 4, 2, 2, //
    4, 4, 10, 0, 2, 2, 2, 2, //
    2, 0, 2, 0, 4, 2, 4, 2, //
    8, 0, 10, 0, 8, 0, 2, 2, //
    4, 0, 0, 4, 4, 2, 2, 4, //
    4, 4, 4, 2, 2, 2, 2, 4, //
    0, 2, 2, 2, 2, 4, 6, 6, //
    2, 0, 0, 0, 2, 6, 0, 0, //
];

const VGA_PARAMS_SIMON2: [u8; 75] = [
    0, 6, 2, 12, 6, 4, 2, 2, //
    4, 4, 9, 0, 1, 2, 2, 2, //
    2, 0, 2, 0, 4, 2, 4, 2, //
    7, 0, 10, 0, 8, 0, 2, 2, //
    4, 0, 0, 4, 4, 2, 2, 4, //
    4, 4, 4, 2, 2, 2, 2, 4, //
    0, 2, 2, 2, 2, 4, 6, 6, //
    2, 0, 6, 6, 4, 6, 0, 0, //
    0, 0, 4, 4, 4, 4, 4, 0, //
    4, 2, 2,
];

const VGA_PARAMS_FEEBLE: [u8; 85] = [
    0, 6, 2, 12, 6, 4, 2, 2, //
    4, 4, 9, 0, 1, 2, 2, 2, //
    2, 0, 2, 0, 4, 2, 4, 2, //
    7, 0, 10, 0, 8, 0, 2, 2, //
    4, 0, 0, 4, 4, 2, 2, 4, //
    4, 4, 4, 2, 2, 2, 2, 4, //
    0, 2, 2, 2, 6, 6, 6, 6, //
    2, 0, 6, 6, 4, 6, 0, 0, //
    0, 0, 4, 4, 4, 4, 4, 0, //
    4, 2, 2, 4, 6, 6, 0, 0, //
    6, 4, 2, 6, 0,
];

/// Operand lengths of the VGA opcodes a variant implements
pub fn vga_param_lengths(game: GameVariant) -> &'static [u8] {
    match game {
        GameVariant::Simon2 => &VGA_PARAMS_SIMON2,
        GameVariant::Feeble | GameVariant::PuzzlePack => &VGA_PARAMS_FEEBLE,
        _ => &VGA_PARAMS_SIMON1,
    }
}

/// Number of VGA opcodes a variant implements
pub fn vga_opcode_count(game: GameVariant) -> usize {
    vga_param_lengths(game).len()
}

pub fn vga_opcode_name(opcode: u16) -> &'static str {
    VGA_OPCODE_NAMES
        .get(opcode as usize)
        .copied()
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_tables_have_variant_sizes() {
        assert_eq!(OpcodeTable::for_game(GameVariant::Elvira1).len(), 300);
        assert_eq!(OpcodeTable::for_game(GameVariant::Simon2).len(), 256);
        assert_eq!(vga_opcode_count(GameVariant::Simon1), 64);
        assert_eq!(vga_opcode_count(GameVariant::Simon2), 75);
        assert_eq!(vga_opcode_count(GameVariant::PuzzlePack), 85);
    }

    #[test]
    fn test_later_games_override_entries() {
        let simon1 = OpcodeTable::for_game(GameVariant::Simon1);
        let simon2 = OpcodeTable::for_game(GameVariant::Simon2);
        assert_eq!(simon1.entry(98), Some(ScriptOp::Animate));
        assert_eq!(simon2.entry(98), Some(ScriptOp::Animate2));
        assert_eq!(simon2.signature(98), Some("BWWWWW"));
        assert_eq!(simon1.entry(42), simon2.entry(42));
    }

    #[test]
    fn test_sparse_gaps_stay_unset() {
        let feeble = OpcodeTable::for_game(GameVariant::Feeble);
        assert!(feeble.entry(127).is_none());
        assert!(feeble.entry(186).is_some());
        let pp = OpcodeTable::for_game(GameVariant::PuzzlePack);
        assert!(pp.entry(186).is_none());
        let elvira2 = OpcodeTable::for_game(GameVariant::Elvira2);
        assert!(elvira2.entry(107).is_none());
        assert!(OpcodeTable::for_game(GameVariant::Waxworks).entry(107).is_some());
        assert!(elvira2.entry(999).is_none());
    }

    #[test]
    fn test_elvira1_keeps_invert_prefix_free() {
        let table = OpcodeTable::for_game(GameVariant::Elvira1);
        assert!(table.entry(GameVariant::Elvira1.invert_prefix()).is_none());
        assert_eq!(table.opcode_of(ScriptOp::Let), Some(64));
        assert_eq!(table.signature(COMMENT_OPCODE), Some("IW"));
    }

    #[test]
    fn test_groups_cover_dispatch() {
        assert_eq!(ScriptOp::Let.group(), OpGroup::Math);
        assert_eq!(ScriptOp::Place.group(), OpGroup::Object);
        assert_eq!(ScriptOp::When.group(), OpGroup::Flow);
        assert_eq!(ScriptOp::AddBox.group(), OpGroup::Display);
        assert!(ScriptOp::CanPut.is_condition());
        assert!(!ScriptOp::Place.is_condition());
    }

    #[test]
    fn test_vga_names() {
        assert_eq!(vga_opcode_name(10), "draw");
        assert_eq!(vga_opcode_name(23), "setSpritePriority");
        assert_eq!(vga_opcode_name(200), "unknown");
        assert_eq!(vga_param_lengths(GameVariant::Simon1)[56], 2);
    }
}
