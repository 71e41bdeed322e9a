//! Translation from parsed tool output to canonical entities.

use enumflags2::BitFlags;
use stormgr_types::{
    AdminState, Disk, DiskStatus, DiskType, Pool, PoolElementType, PoolStatus, RaidType, System,
    SystemStatus, Volume,
};

use crate::SmartArrayError;
use crate::parser::Block;
use crate::sysfs::Sysfs;

/// Block size assumed for logical drives the kernel does not expose.
pub const LOGICAL_BLOCK_SIZE: u64 = 512;

const ARRAY_PREFIX: &str = "Array: ";
const LOGICAL_DRIVE_PREFIX: &str = "Logical Drive: ";
const PHYSICAL_DRIVE_PREFIX: &str = "physicaldrive ";
const UNASSIGNED: &str = "unassigned";
const STATUS_KEYS: [&str; 3] = [
    "Controller Status",
    "Cache Status",
    "Battery/Capacitor Status",
];

/// Converts a tool size such as `136.7 GB` to bytes.
///
/// The tool prints binary multiples with decimal unit names. Anything after
/// the unit, such as a `(0.0%)` share, is ignored.
///
/// # Errors
///
/// [`SmartArrayError::BadSize`] for any other shape.
pub fn size_bytes(text: &str) -> Result<u64, SmartArrayError> {
    let bad = || SmartArrayError::BadSize {
        value: text.to_owned(),
    };
    let mut words = text.split_whitespace();
    let (Some(number), Some(unit)) = (words.next(), words.next()) else {
        return Err(bad());
    };
    let shift = match unit {
        "KB" => 10,
        "MB" => 20,
        "GB" => 30,
        "TB" => 40,
        "PB" => 50,
        "EB" => 60,
        _ => return Err(bad()),
    };
    let multiplier = 1_u64 << shift;
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() || !fraction.chars().all(|digit| digit.is_ascii_digit()) {
        return Err(bad());
    }
    let whole: u64 = whole.parse().map_err(|_| bad())?;
    let mut bytes = whole.checked_mul(multiplier).ok_or_else(bad)?;
    if !fraction.is_empty() {
        let digits = u32::try_from(fraction.len()).map_err(|_| bad())?;
        let scale = 10_u64.checked_pow(digits).ok_or_else(bad)?;
        let numerator: u64 = fraction.parse().map_err(|_| bad())?;
        let part = numerator
            .checked_mul(multiplier)
            .and_then(|scaled| scaled.checked_div(scale))
            .ok_or_else(bad)?;
        bytes = bytes.checked_add(part).ok_or_else(bad)?;
    }
    Ok(bytes)
}

fn number(block: &Block, key: &str, context: &str) -> Result<u64, SmartArrayError> {
    let raw = block.require(key, context)?;
    raw.parse().map_err(|_| SmartArrayError::BadNumber {
        key: key.to_owned(),
        value: raw.to_owned(),
    })
}

/// System health from one controller's `show status` block.
///
/// Any of the controller, cache or battery reporting something other than
/// `OK` marks the system `Other` and is quoted in the status info.
#[must_use]
pub fn system_status(status: &Block) -> (SystemStatus, String) {
    let problems: Vec<String> = STATUS_KEYS
        .iter()
        .filter_map(|key| {
            status
                .value(key)
                .filter(|value| *value != "OK")
                .map(|value| format!("{key}: {value}"))
        })
        .collect();
    if problems.is_empty() {
        (SystemStatus::Ok, String::new())
    } else {
        (SystemStatus::Other, problems.join(", "))
    }
}

/// Builds a [`System`] from a controller's detail and status blocks.
///
/// # Errors
///
/// Fails when the serial number or slot is missing.
pub fn system(name: &str, detail: &Block, status: &Block) -> Result<System, SmartArrayError> {
    let (health, status_info) = system_status(status);
    Ok(System {
        id: detail.require("Serial Number", name)?.to_owned(),
        name: name.to_owned(),
        status: health.into(),
        status_info,
        plugin_data: Some(detail.require("Slot", name)?.to_owned()),
    })
}

/// Pool identifier: system id joined with the array name minus spaces.
#[must_use]
pub fn pool_id(system_id: &str, array_key: &str) -> String {
    format!("{system_id}:{}", array_key.replace(' ', ""))
}

/// Blocks of `controller` that describe arrays, with their letters.
pub fn arrays(controller: &Block) -> impl Iterator<Item = (&str, &str, &Block)> {
    controller.blocks().filter_map(|(key, block)| {
        key.strip_prefix(ARRAY_PREFIX)
            .map(|letter| (key, letter, block))
    })
}

/// Logical drives of `array`, with their numbers.
pub fn logical_drives(array: &Block) -> impl Iterator<Item = (&str, &str, &Block)> {
    array.blocks().filter_map(|(key, block)| {
        key.strip_prefix(LOGICAL_DRIVE_PREFIX)
            .map(|number| (key, number, block))
    })
}

/// Physical drives listed in `parent`, with their bay addresses.
pub fn physical_drives(parent: &Block) -> impl Iterator<Item = (&str, &Block)> {
    parent.blocks().filter_map(|(key, block)| {
        key.strip_prefix(PHYSICAL_DRIVE_PREFIX)
            .map(|address| (address, block))
    })
}

/// Block listing drives not assigned to any array.
#[must_use]
pub fn unassigned(controller: &Block) -> Option<&Block> {
    controller.block(UNASSIGNED)
}

/// Builds a [`Pool`] from one array block.
///
/// The tool reports no exact capacity, so total space is the unused space
/// plus the size of every logical drive.
///
/// # Errors
///
/// Fails when a size or the status is missing or malformed.
pub fn pool(
    array_key: &str,
    letter: &str,
    array: &Block,
    system_id: &str,
    slot: &str,
) -> Result<Pool, SmartArrayError> {
    let free_space = size_bytes(array.require("Unused Space", array_key)?)?;
    let mut total_space = free_space;
    for (drive_key, _, drive) in logical_drives(array) {
        let size = size_bytes(drive.require("Size", drive_key)?)?;
        total_space = total_space.saturating_add(size);
    }
    let raw_status = array.require("Status", array_key)?;
    let (status, status_info) = if raw_status == "OK" {
        (PoolStatus::Ok, String::new())
    } else {
        (PoolStatus::Other, raw_status.to_owned())
    };
    Ok(Pool {
        id: pool_id(system_id, array_key),
        name: array_key.to_owned(),
        element_type: PoolElementType::Volume | PoolElementType::VolumeFull,
        unsupported_actions: BitFlags::empty(),
        total_space,
        free_space,
        status: status.into(),
        status_info,
        system_id: system_id.to_owned(),
        plugin_data: Some(format!("{slot}:{letter}")),
    })
}

// `/dev/sdX` named by a logical drive's `Disk Name`, if any.
fn block_device(disk_name: &str) -> Option<&str> {
    let start = disk_name.find("/dev/sd")?;
    let device = disk_name.get(start..)?;
    let end = device
        .char_indices()
        .skip("/dev/sd".len())
        .find(|(_, ch)| !ch.is_ascii_lowercase())
        .map_or(device.len(), |(index, _)| index);
    let device = device.get(..end)?;
    (device.len() > "/dev/sd".len()).then_some(device)
}

/// Builds a [`Volume`] from one logical drive block.
///
/// The volume id is the drive's unique identifier, lower-cased, which is
/// also its SCSI VPD 0x83 identifier. Geometry comes from `sysfs` when the
/// drive is attached as a disk; otherwise the tool's size is split into
/// [`LOGICAL_BLOCK_SIZE`] blocks.
///
/// # Errors
///
/// Fails when the identifier or size is missing or malformed, or when the
/// kernel's geometry cannot be read.
pub fn volume(
    drive_key: &str,
    number: &str,
    drive: &Block,
    pool_id: &str,
    system_id: &str,
    location: (&str, &str),
    sysfs: &Sysfs,
) -> Result<Volume, SmartArrayError> {
    let (slot, letter) = location;
    let vpd83 = drive
        .require("Unique Identifier", drive_key)?
        .to_ascii_lowercase();
    let size = size_bytes(drive.require("Size", drive_key)?)?;
    let device = drive.value("Disk Name").and_then(block_device);
    let geometry = match device.and_then(|path| path.strip_prefix("/dev/")) {
        Some(name) => sysfs.geometry(name)?,
        None => None,
    };
    let (block_size, num_of_blocks) = geometry.map_or_else(
        || {
            (
                LOGICAL_BLOCK_SIZE,
                size.checked_div(LOGICAL_BLOCK_SIZE).unwrap_or_default(),
            )
        },
        |geometry| (geometry.block_size, geometry.num_of_blocks),
    );
    let name = match device {
        Some(device) => format!("{drive_key}: {device}"),
        None => drive_key.to_owned(),
    };
    Ok(Volume {
        id: vpd83.clone(),
        name,
        vpd83,
        block_size,
        num_of_blocks,
        admin_state: AdminState::Enabled,
        system_id: system_id.to_owned(),
        pool_id: pool_id.to_owned(),
        plugin_data: Some(format!("{slot}:{letter}:{number}")),
    })
}

/// Maps the tool's interface type onto a [`DiskType`].
#[must_use]
pub fn disk_type(interface: &str) -> DiskType {
    match interface {
        "SATA" => DiskType::Sata,
        "SAS" => DiskType::Sas,
        "Solid State SATA" | "Solid State SAS" => DiskType::Ssd,
        _ => DiskType::Unknown,
    }
}

/// Builds a [`Disk`] from one physical drive block.
///
/// # Errors
///
/// Fails when a required field is missing or malformed.
pub fn disk(
    address: &str,
    drive: &Block,
    system_id: &str,
    slot: &str,
    free: bool,
) -> Result<Disk, SmartArrayError> {
    let context = format!("physicaldrive {address}");
    let block_size = number(drive, "Native Block Size", &context)?;
    let size = size_bytes(drive.require("Size", &context)?)?;
    let mut status: BitFlags<DiskStatus> = if drive.require("Status", &context)? == "OK" {
        DiskStatus::Ok.into()
    } else {
        DiskStatus::Other.into()
    };
    if free {
        status |= DiskStatus::Free;
    }
    Ok(Disk {
        id: drive.require("Serial Number", &context)?.to_owned(),
        name: format!("{} {address}", drive.require("Model", &context)?),
        disk_type: disk_type(drive.require("Interface Type", &context)?),
        block_size,
        num_of_blocks: size.checked_div(block_size).unwrap_or_default(),
        status,
        system_id: system_id.to_owned(),
        plugin_data: Some(format!("{slot}:{address}")),
    })
}

/// Maps the tool's `Fault Tolerance` onto a [`RaidType`].
#[must_use]
pub fn raid_type(fault_tolerance: &str) -> RaidType {
    match fault_tolerance {
        "0" => RaidType::Raid0,
        "1" => RaidType::Raid1,
        "5" => RaidType::Raid5,
        "6" | "6 (ADG)" => RaidType::Raid6,
        "1+0" => RaidType::Raid10,
        "50" => RaidType::Raid50,
        "60" => RaidType::Raid60,
        _ => RaidType::Unknown,
    }
}
