use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::flow::FlowMatch;
use crate::{PortNo, SwitchId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeviceError {
    #[error("session for s{switch} is closed")]
    SessionClosed { switch: SwitchId },
}

/// Frame carried by a packet-out: either a buffer still held by the switch or
/// the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Buffered { buffer_id: u32 },
    Raw { data: Vec<u8> },
}

/// Flow-table entry pushed to a single switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowRule {
    pub flow_match: FlowMatch,
    pub out_port: PortNo,
    pub idle_timeout: u16,
    pub notify_on_removal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum DeviceCommand {
    Flood {
        switch: SwitchId,
        payload: Payload,
        in_port: Option<PortNo>,
        exclude_ports: Vec<PortNo>,
    },
    Drop {
        switch: SwitchId,
        buffer_id: u32,
        in_port: PortNo,
    },
    Unicast {
        switch: SwitchId,
        payload: Payload,
        out_port: PortNo,
    },
    InstallRule {
        switch: SwitchId,
        rule: FlowRule,
    },
    PortFlooding {
        switch: SwitchId,
        port: PortNo,
        enabled: bool,
    },
}

impl DeviceCommand {
    pub fn switch(&self) -> SwitchId {
        match self {
            DeviceCommand::Flood { switch, .. }
            | DeviceCommand::Drop { switch, .. }
            | DeviceCommand::Unicast { switch, .. }
            | DeviceCommand::InstallRule { switch, .. }
            | DeviceCommand::PortFlooding { switch, .. } => *switch,
        }
    }
}

/// Outbound half of the per-switch sessions.
///
/// Every send is fire-and-forget: `Ok` means the command was handed to the
/// session layer, not that the switch applied it.
pub trait DeviceSession {
    fn send(&mut self, command: DeviceCommand) -> Result<(), DeviceError>;

    fn send_flood(
        &mut self,
        switch: SwitchId,
        payload: Payload,
        in_port: Option<PortNo>,
        exclude_ports: Vec<PortNo>,
    ) -> Result<(), DeviceError> {
        self.send(DeviceCommand::Flood {
            switch,
            payload,
            in_port,
            exclude_ports,
        })
    }

    fn send_drop(&mut self, switch: SwitchId, buffer_id: u32, in_port: PortNo) -> Result<(), DeviceError> {
        self.send(DeviceCommand::Drop {
            switch,
            buffer_id,
            in_port,
        })
    }

    fn send_unicast(&mut self, switch: SwitchId, payload: Payload, out_port: PortNo) -> Result<(), DeviceError> {
        self.send(DeviceCommand::Unicast {
            switch,
            payload,
            out_port,
        })
    }

    fn install_rule(&mut self, switch: SwitchId, rule: FlowRule) -> Result<(), DeviceError> {
        self.send(DeviceCommand::InstallRule { switch, rule })
    }

    fn set_port_flooding(&mut self, switch: SwitchId, port: PortNo, enabled: bool) -> Result<(), DeviceError> {
        self.send(DeviceCommand::PortFlooding {
            switch,
            port,
            enabled,
        })
    }
}

/// Session layer stand-in that queues commands on an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelDevice {
    tx: mpsc::UnboundedSender<DeviceCommand>,
}

impl ChannelDevice {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DeviceCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DeviceSession for ChannelDevice {
    fn send(&mut self, command: DeviceCommand) -> Result<(), DeviceError> {
        let switch = command.switch();
        self.tx
            .send(command)
            .map_err(|_| DeviceError::SessionClosed { switch })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_device_queues_in_order() {
        let (mut device, mut rx) = ChannelDevice::new();

        device.send_drop(1, 7, 2).unwrap();
        device.set_port_flooding(1, 3, true).unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            DeviceCommand::Drop { switch: 1, buffer_id: 7, in_port: 2 }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            DeviceCommand::PortFlooding { switch: 1, port: 3, enabled: true }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_channel_reports_switch() {
        let (mut device, rx) = ChannelDevice::new();
        drop(rx);

        let err = device.send_unicast(4, Payload::Raw { data: vec![1] }, 1).unwrap_err();
        assert_eq!(err, DeviceError::SessionClosed { switch: 4 });
    }
}
